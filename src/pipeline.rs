//! Message-in, message-out flow: extract, run, present.

use chrono::Utc;

use crate::error::ExtractError;
use crate::extract;
use crate::present::{MessageLink, Presentation, ResultPresenter};
use crate::sandbox::{RunRequest, RunResult, SandboxRunner};

/// Everything produced for one message.
#[derive(Debug, Clone)]
pub struct MessageRun {
    pub result: RunResult,
    pub presentation: Presentation,
}

/// Run the snippet fenced in `text` and render the outcome.
///
/// Fails only when the message holds no recognizable code block; every
/// execution failure is part of the returned [`RunResult`].
pub async fn run_message(
    runner: &SandboxRunner,
    presenter: &ResultPresenter,
    text: &str,
    link: Option<&MessageLink>,
    allow_imports: bool,
) -> Result<MessageRun, ExtractError> {
    let block = extract::extract(text)?;
    tracing::debug!(language = %block.language, bytes = block.body.len(), "code block extracted");

    let request = RunRequest::new(block.language, block.body).allow_imports(allow_imports);
    let result = runner.run(&request).await;
    let presentation = presenter.format(&result, link, Utc::now());

    Ok(MessageRun {
        result,
        presentation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::ExitStatus;

    #[tokio::test]
    async fn test_no_code_block() {
        let runner = SandboxRunner::with_defaults();
        let presenter = ResultPresenter::default();

        let err = run_message(&runner, &presenter, "hello there", None, false)
            .await
            .unwrap_err();
        assert_eq!(err, ExtractError::NoMatch);
        assert!(err.to_string().contains("`js` or `ts`"));
    }

    #[tokio::test]
    async fn test_import_rejected_through_pipeline() {
        let runner = SandboxRunner::with_defaults();
        let presenter = ResultPresenter::default();
        let link = MessageLink::new("10", "20");

        let run = run_message(
            &runner,
            &presenter,
            "```ts\nimport { serve } from \"std/http\";\n```",
            Some(&link),
            false,
        )
        .await
        .unwrap();

        assert_eq!(
            run.result.status,
            ExitStatus::InternalError("Imports are not allowed".to_string())
        );
        assert!(run.presentation.content.contains("**Error:** Imports are not allowed"));
        assert!(run.presentation.content.contains("channels/@me/10/20"));
        assert!(run.presentation.rerun_enabled);
    }
}
