mod common;
mod config;
mod oracle;
mod vectors;
