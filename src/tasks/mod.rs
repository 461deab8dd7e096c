//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod tick_loop;

pub(crate) use tick_loop::tick_loop;
