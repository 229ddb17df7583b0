// Payload sniffing - classifies uploads by their leading magic bytes.

pub mod format;
