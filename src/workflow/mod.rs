pub mod cancel;
pub mod report_ctx;
pub mod report_flow;

pub use cancel::CancelToken;
pub use report_ctx::ReportCtx;
pub use report_flow::ReportFlow;
