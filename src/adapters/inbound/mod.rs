mod clipboard_poller;

pub use clipboard_poller::ClipboardPoller;
