mod common;
mod connection;
mod prepare;
