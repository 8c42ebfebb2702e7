pub mod downloader_card;
pub mod status_message;
