// HTTP surface - router, handlers and server lifecycle.

pub mod handler;
