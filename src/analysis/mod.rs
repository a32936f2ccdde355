//! Archive analysis: from uploaded source to merged architecture metadata.
//!
//! Projects are analysed one after another. A project whose prompt is too
//! large, whose inference call fails or whose answer is not a JSON object
//! is recorded as a [`ProjectFailure`] and the run moves on.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::archive::{EntrySource, SourceArchive};
use crate::budget::BudgetAllocator;
use crate::config::LimitsConfig;
use crate::detect;
use crate::merge::{self, MergeOutcome};
use crate::models::metadata;
use crate::models::{FileSummary, Metadata};
use crate::prompt::{self, InferenceParams, PromptError};
use crate::providers::{InferenceProvider, ProviderError};

/// Characters of a failure message kept in logs.
const LOG_ERROR_PREVIEW: usize = 200;

/// Why one project produced no metadata.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A project that was skipped.
#[derive(Debug)]
pub struct ProjectFailure {
    pub name: String,
    pub root: String,
    pub error: AnalysisError,
}

/// Summary of one analysis run.
#[derive(Debug)]
pub struct AnalysisReport {
    pub outcome: MergeOutcome,
    pub projects_analyzed: usize,
    pub files_collected: usize,
    pub bytes_used: usize,
    pub failures: Vec<ProjectFailure>,
}

/// Files selected for one project, before any model call.
#[derive(Debug, Clone)]
pub struct ProjectSelection {
    pub name: String,
    pub root: String,
    pub summaries: Vec<FileSummary>,
    pub bytes: usize,
}

/// Detect projects and allocate the file budget without calling a model.
pub fn select(
    names: &[String],
    source: &mut dyn EntrySource,
    limits: &LimitsConfig,
) -> Vec<ProjectSelection> {
    let projects = detect::detect(names);
    info!(projects = projects.len(), "detected projects");
    for (root, files) in &projects {
        info!(root = %root, files = files.len(), "project root");
    }

    let mut allocator = BudgetAllocator::new(limits);
    let mut selections = Vec::with_capacity(projects.len());
    for (root, files) in &projects {
        if allocator.files_exhausted() {
            info!(limit = limits.max_total_files, "total file limit reached");
            break;
        }
        let name = detect::project_name(root).to_string();
        let allocation = allocator.allocate_project(root, files, source);
        info!(
            project = %name,
            files = allocation.summaries.len(),
            bytes = allocation.bytes,
            "collected project files"
        );
        selections.push(ProjectSelection {
            name,
            root: root.clone(),
            summaries: allocation.summaries,
            bytes: allocation.bytes,
        });
    }
    selections
}

/// Runs the analysis stages against an inference provider.
pub struct AnalysisPipeline {
    provider: Arc<dyn InferenceProvider>,
    limits: LimitsConfig,
    params: InferenceParams,
}

impl AnalysisPipeline {
    pub fn new(provider: Arc<dyn InferenceProvider>, limits: LimitsConfig) -> Self {
        Self {
            provider,
            limits,
            params: InferenceParams::analysis(),
        }
    }

    /// Analyse every project of an archive and merge the results.
    pub async fn run(&self, archive: &mut SourceArchive) -> AnalysisReport {
        let names = archive.file_names().to_vec();
        self.run_source(&names, archive).await
    }

    /// Same as [`run`](Self::run) over any entry source.
    pub async fn run_source(
        &self,
        names: &[String],
        source: &mut dyn EntrySource,
    ) -> AnalysisReport {
        let selections = select(names, source, &self.limits);

        let mut docs = Vec::new();
        let mut failures = Vec::new();
        let mut files_collected = 0;
        let mut bytes_used = 0;

        for selection in selections {
            files_collected += selection.summaries.len();
            bytes_used += selection.bytes;
            if selection.summaries.is_empty() {
                continue;
            }

            match self.analyze_project(&selection).await {
                Ok(doc) => {
                    info!(project = %selection.name, "analysis succeeded");
                    docs.push(doc);
                }
                Err(error) => {
                    let msg = error.to_string();
                    let preview: String = msg.chars().take(LOG_ERROR_PREVIEW).collect();
                    warn!(project = %selection.name, "analysis failed: {preview}");
                    failures.push(ProjectFailure {
                        name: selection.name,
                        root: selection.root,
                        error,
                    });
                }
            }
        }

        let projects_analyzed = docs.len();
        if projects_analyzed == 0 {
            warn!("no project produced usable metadata");
        }
        AnalysisReport {
            outcome: merge::merge(docs),
            projects_analyzed,
            files_collected,
            bytes_used,
            failures,
        }
    }

    async fn analyze_project(&self, selection: &ProjectSelection) -> Result<Metadata, AnalysisError> {
        let context = prompt::project_context(&selection.name, &selection.root);
        let text = prompt::build_analysis_prompt(&selection.summaries, &context);
        prompt::check_payload(&text, &self.params, self.limits.payload_ceiling_bytes)?;

        let answer = self.provider.infer(&text, &self.params).await?;
        let mut doc = prompt::parse_metadata(&answer)?;
        metadata::annotate(&mut doc, &selection.name, &selection.root);
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use std::sync::Mutex;

    /// Answers from a queue and records every prompt.
    struct Scripted {
        answers: Mutex<Vec<Result<String, String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(answers: Vec<Result<&str, &str>>) -> Arc<Self> {
            let mut answers: Vec<_> = answers
                .into_iter()
                .map(|a| a.map(str::to_string).map_err(str::to_string))
                .collect();
            answers.reverse();
            Arc::new(Self {
                answers: Mutex::new(answers),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InferenceProvider for Scripted {
        async fn infer(&self, prompt: &str, _: &InferenceParams) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.answers.lock().unwrap().pop() {
                Some(Ok(a)) => Ok(a),
                Some(Err(e)) => Err(ProviderError::ApiError(e)),
                None => Err(ProviderError::ApiError("no scripted answer".into())),
            }
        }
    }

    fn source(entries: &[(&str, &str)]) -> (Vec<String>, IndexMap<String, Vec<u8>>) {
        let names = entries.iter().map(|(k, _)| k.to_string()).collect();
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect();
        (names, map)
    }

    #[tokio::test]
    async fn single_project_passes_through_annotated() {
        let (names, mut map) = source(&[("main.tf", "provider \"aws\" {}")]);
        let provider = Scripted::new(vec![Ok("```json\n{\"services\": []}\n```")]);
        let pipeline = AnalysisPipeline::new(provider.clone(), LimitsConfig::default());

        let report = pipeline.run_source(&names, &mut map).await;
        assert_eq!(report.projects_analyzed, 1);
        assert_eq!(report.files_collected, 1);
        let doc = match report.outcome {
            MergeOutcome::Single(doc) => doc,
            other => panic!("expected single outcome, got {other:?}"),
        };
        assert_eq!(doc["projectName"], "root");
        assert_eq!(doc["projectRoot"], ".");

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("Analyze project 'root' at '.'"));
        assert!(prompts[0].contains("[main.tf]\nprovider \"aws\" {}"));
    }

    #[tokio::test]
    async fn failing_project_does_not_stop_the_run() {
        let (names, mut map) = source(&[
            ("api/package.json", "{\"name\": \"api\"}"),
            ("web/package.json", "{\"name\": \"web\"}"),
            ("ops/main.tf", "terraform {}"),
        ]);
        let provider = Scripted::new(vec![
            Err("HTTP 429 Too Many Requests"),
            Ok("not json at all"),
            Ok("{\"services\": [{\"name\": \"tf\"}]}"),
        ]);
        let pipeline = AnalysisPipeline::new(provider, LimitsConfig::default());

        let report = pipeline.run_source(&names, &mut map).await;
        assert_eq!(report.projects_analyzed, 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].name, "api");
        assert!(matches!(report.failures[0].error, AnalysisError::Provider(_)));
        assert!(matches!(
            report.failures[1].error,
            AnalysisError::Prompt(PromptError::MalformedJson(_))
        ));
        let doc = report.outcome.into_document().unwrap();
        assert_eq!(doc["projectName"], "ops");
    }

    #[tokio::test]
    async fn oversized_prompt_is_never_sent() {
        let (names, mut map) = source(&[("main.tf", "resource \"a\" \"b\" {}")]);
        let provider = Scripted::new(vec![Ok("{}")]);
        let limits = LimitsConfig {
            payload_ceiling_bytes: 100,
            ..LimitsConfig::default()
        };
        let pipeline = AnalysisPipeline::new(provider.clone(), limits);

        let report = pipeline.run_source(&names, &mut map).await;
        assert_eq!(report.projects_analyzed, 0);
        assert!(matches!(
            report.failures[0].error,
            AnalysisError::Prompt(PromptError::PayloadTooLarge { .. })
        ));
        assert!(provider.prompts.lock().unwrap().is_empty());
        assert_eq!(report.outcome, MergeOutcome::NoResults);
    }

    #[tokio::test]
    async fn projects_without_signal_files_are_not_sent() {
        let (names, mut map) = source(&[("src/index.js", "console.log(1)")]);
        let provider = Scripted::new(vec![]);
        let pipeline = AnalysisPipeline::new(provider.clone(), LimitsConfig::default());

        let report = pipeline.run_source(&names, &mut map).await;
        assert_eq!(report.files_collected, 0);
        assert!(report.failures.is_empty());
        assert!(provider.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn select_reports_ranked_files_per_project() {
        let (names, mut map) = source(&[
            ("svc/README.md", "hello"),
            ("svc/Dockerfile", "FROM alpine"),
            ("svc/package.json", "{}"),
        ]);
        let selections = select(&names, &mut map, &LimitsConfig::default());
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].name, "svc");
        let paths: Vec<_> = selections[0].summaries.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, ["Dockerfile", "package.json", "README.md"]);
    }
}
