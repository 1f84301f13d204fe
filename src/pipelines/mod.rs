pub mod detective;
pub mod word_count;

/// Name of the agent that starts every chat and executes tool calls.
pub const USER_PROXY: &str = "user_proxy";

/// Name of the assistant that drives the PDF tools.
pub const PDF_MASTER: &str = "PDFMaster";
