// Profile intake. The latest profile per user is the input to every generation stage.

pub mod handlers;
