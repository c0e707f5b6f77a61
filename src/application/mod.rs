pub mod pipeline;

pub use pipeline::{
    AggregationPipeline, ChainFailure, PipelineError, PipelineOutput, ProviderReport,
    ProviderResult, ProviderStatus, RunReport,
};
