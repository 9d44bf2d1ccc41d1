pub mod consultation;
pub mod document;
pub mod evaluation;
pub mod loaders;
pub mod profile;
pub mod report;
pub mod request;
pub mod student;
pub mod template;
pub mod topik;

pub use consultation::{ConsultationCategory, ConsultationId, ConsultationRecord, DateRange, RawConsultation};
pub use document::{Document, Field, Section, Table};
pub use evaluation::{DimensionKey, Evaluation, EvaluationDimension, PreferenceChoice, Rating};
pub use loaders::{load_batch_file, load_dataset, Dataset};
pub use profile::{Achievement, AggregatedProfile, ConsultationSummary, DimensionSnapshot, PreferenceEntry};
pub use report::{GeneratedReport, NewReport, ReportId, ReportStatus, ReportUpdate};
pub use request::ReportRequest;
pub use student::{Student, StudentId};
pub use template::{Language, RenderFormat, ReportField, ReportPurpose, ReportTemplate};
pub use topik::{ScoreBounds, Subscore, TopikTestResult};
