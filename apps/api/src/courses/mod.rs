// Course read side: ownership-scoped gateway, API views and read handlers.

pub mod gateway;
pub mod handlers;
pub mod views;
