#![allow(dead_code)]

pub mod webhook_server;
