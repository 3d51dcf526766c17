use crate::domain::{AnalysisRequest, OutputArtifact, PostResult};

pub trait AnalysisExecutor {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>>;
}

#[cfg(test)]
mod tests {
    use super::AnalysisExecutor;
    use crate::domain::{
        AnalysisKind, AnalysisRequest, OutputArtifact, PostError, PostErrorCategory, PostResult,
    };

    struct FailingAnalysis;

    impl AnalysisExecutor for FailingAnalysis {
        fn execute(&self, _request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
            Err(PostError::computation("RUN.ANALYSIS", "analysis failed"))
        }
    }

    #[test]
    fn executors_share_the_error_taxonomy() {
        let request = AnalysisRequest::new("dos", AnalysisKind::DensityOfStates, "data", "figs");
        let error = FailingAnalysis
            .execute(&request)
            .expect_err("executor should fail");
        assert_eq!(error.category(), PostErrorCategory::ComputationError);
        assert_eq!(error.exit_code(), 4);
        assert_eq!(error.placeholder(), "RUN.ANALYSIS");
    }
}
