use crate::support::{
    helpers::{dec, evm_lines, indices, init_tracing, insufficient, job_builder, quick_job},
    mock_exchange::{MockExchange, Reply},
};
use anyhow::Result;
use batch_withdraw::{
    BatchOrchestrator, BatchWarning, ExchangeError, ItemOutcome, SkipReason, StatusEvent,
    StopHandle, TerminalState,
};

#[tokio::test]
async fn fatal_failure_aborts_with_no_later_events() -> Result<()> {
    init_tracing();
    let exchange = MockExchange::scripted(vec![Reply::Accept, Reply::Reject(insufficient())]);
    let orchestrator = BatchOrchestrator::new(exchange.as_client());

    let job = quick_job(&evm_lines(&["1", "1", "1", "1"]), "10")?;
    let mut events: Vec<StatusEvent> = Vec::new();
    let report = orchestrator
        .run(job, &mut events, &StopHandle::new())
        .await?;

    assert_eq!(
        report.state,
        TerminalState::Aborted {
            index: 1,
            reason: insufficient(),
        }
    );
    assert_eq!(indices(&events), vec![0, 1]);
    assert!(matches!(
        events[1].outcome,
        ItemOutcome::CallFailed {
            reason: ExchangeError::InsufficientExchangeBalance { .. }
        }
    ));
    assert_eq!(exchange.call_count(), 2);
    assert_eq!(orchestrator.telemetry().snapshot().aborted_runs, 1);
    Ok(())
}

#[tokio::test]
async fn abort_can_report_skipped_items() -> Result<()> {
    init_tracing();
    let exchange = MockExchange::scripted(vec![Reply::Reject(insufficient())]);
    let orchestrator = BatchOrchestrator::new(exchange.as_client());

    let job = job_builder(&evm_lines(&["1", "1", "1"]), "10")
        .report_skipped(true)
        .build()?;
    let report = orchestrator
        .run(job, &mut Vec::<StatusEvent>::new(), &StopHandle::new())
        .await?;

    assert!(matches!(report.state, TerminalState::Aborted { index: 0, .. }));
    assert_eq!(indices(&report.events), vec![0, 1, 2]);
    assert!(report.events[1..].iter().all(|event| event.outcome
        == ItemOutcome::Skipped {
            reason: SkipReason::Aborted
        }));
    assert_eq!(exchange.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn non_fatal_failures_continue_the_batch() -> Result<()> {
    init_tracing();
    let exchange = MockExchange::scripted(vec![
        Reply::Reject(ExchangeError::TransientNetworkError {
            message: "connection reset".into(),
        }),
        Reply::Reject(ExchangeError::InvalidParameters {
            message: "bad chain".into(),
        }),
        Reply::Accept,
    ]);
    let orchestrator = BatchOrchestrator::new(exchange.as_client());

    let job = quick_job(&evm_lines(&["1", "1", "1"]), "3")?;
    let report = orchestrator
        .run(job, &mut Vec::<StatusEvent>::new(), &StopHandle::new())
        .await?;

    assert_eq!(report.state, TerminalState::Completed);
    assert_eq!(report.failures().count(), 2);
    assert_eq!(report.successes().count(), 1);
    assert_eq!(report.remaining_balance, dec("2"));
    assert!(report.warnings.is_empty());
    Ok(())
}

#[tokio::test]
async fn unauthorized_raises_a_single_warning() -> Result<()> {
    init_tracing();
    let unauthorized = || {
        Reply::Reject(ExchangeError::Unauthorized {
            message: "invalid api key".into(),
        })
    };
    let exchange = MockExchange::scripted(vec![unauthorized(), unauthorized(), unauthorized()]);
    let orchestrator = BatchOrchestrator::new(exchange.as_client());

    let job = quick_job(&evm_lines(&["1", "1", "1"]), "3")?;
    let report = orchestrator
        .run(job, &mut Vec::<StatusEvent>::new(), &StopHandle::new())
        .await?;

    assert_eq!(report.state, TerminalState::Completed);
    assert_eq!(report.events.len(), 3);
    assert_eq!(
        report.warnings,
        vec![BatchWarning::Unauthorized {
            index: 0,
            message: "invalid api key".into(),
        }]
    );
    Ok(())
}

#[tokio::test]
async fn unauthorized_halts_when_configured() -> Result<()> {
    init_tracing();
    let exchange = MockExchange::scripted(vec![
        Reply::Accept,
        Reply::Reject(ExchangeError::Unauthorized {
            message: "expired".into(),
        }),
    ]);
    let orchestrator = BatchOrchestrator::new(exchange.as_client());

    let job = job_builder(&evm_lines(&["1", "1", "1"]), "3")
        .halt_on_unauthorized(true)
        .build()?;
    let report = orchestrator
        .run(job, &mut Vec::<StatusEvent>::new(), &StopHandle::new())
        .await?;

    assert!(matches!(
        report.state,
        TerminalState::Aborted {
            index: 1,
            reason: ExchangeError::Unauthorized { .. }
        }
    ));
    assert_eq!(report.events.len(), 2);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(exchange.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn classified_exchange_messages_drive_the_abort() -> Result<()> {
    init_tracing();
    let exchange = MockExchange::scripted(vec![Reply::Reject(ExchangeError::classify(
        Some(400),
        "余额不足",
    ))]);
    let orchestrator = BatchOrchestrator::new(exchange.as_client());

    let job = quick_job(&evm_lines(&["1", "1"]), "2")?;
    let report = orchestrator
        .run(job, &mut Vec::<StatusEvent>::new(), &StopHandle::new())
        .await?;

    assert!(matches!(report.state, TerminalState::Aborted { index: 0, .. }));
    assert_eq!(exchange.call_count(), 1);
    Ok(())
}
