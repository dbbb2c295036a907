// Text diffing used for snapshot-backed change capture.

pub mod line;
