pub mod archive_ports;
pub mod item_ports;
pub mod quota_ports;
pub mod trash_ports;
