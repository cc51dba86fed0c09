mod common;
mod datagram;
mod stream;
