use crate::support::{
    helpers::{dec, evm_address, evm_lines, indices, init_tracing, is_success, quick_job},
    mock_exchange::MockExchange,
};
use anyhow::Result;
use batch_withdraw::{
    BatchError, BatchOrchestrator, DryRunExchange, ItemOutcome, NullSink, StatusEvent,
    StopHandle, TerminalState,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::test]
async fn every_item_gets_one_event_in_order() -> Result<()> {
    init_tracing();
    let exchange = MockExchange::new();
    let orchestrator = BatchOrchestrator::new(exchange.as_client());
    let mut events: Vec<StatusEvent> = Vec::new();

    let job = quick_job(&evm_lines(&["1", "2", "3", "4"]), "20")?;
    let report = orchestrator
        .run(job, &mut events, &StopHandle::new())
        .await?;

    assert_eq!(report.state, TerminalState::Completed);
    assert_eq!(indices(&events), vec![0, 1, 2, 3]);
    assert!(events.iter().all(is_success));
    assert_eq!(events, report.events);
    assert_eq!(report.total_withdrawn, dec("10"));
    assert_eq!(report.remaining_balance, dec("10"));

    let calls = exchange.calls();
    assert_eq!(calls.len(), 4);
    for (n, call) in calls.iter().enumerate() {
        assert_eq!(call.address, evm_address(n + 1));
        assert_eq!(call.currency, "USDT");
        assert_eq!(call.chain, "USDT-ERC20");
    }
    Ok(())
}

#[tokio::test]
async fn two_fives_against_twenty_leave_ten() -> Result<()> {
    init_tracing();
    let exchange = Arc::new(DryRunExchange::new(dec("20")));
    let orchestrator = BatchOrchestrator::new(exchange.clone());

    let job = quick_job(&evm_lines(&["5", "5"]), "20")?;
    let report = orchestrator.run(job, &mut NullSink, &StopHandle::new()).await?;

    assert!(report.is_completed());
    assert_eq!(report.successes().count(), 2);
    assert_eq!(report.remaining_balance, dec("10"));
    assert_eq!(exchange.balance().await, dec("10"));
    Ok(())
}

#[tokio::test]
async fn preflight_refuses_batch_larger_than_balance() -> Result<()> {
    init_tracing();
    let exchange = MockExchange::new();
    let orchestrator = BatchOrchestrator::new(exchange.as_client());
    let mut events: Vec<StatusEvent> = Vec::new();

    let job = quick_job(&evm_lines(&["10", "5"]), "12")?;
    let err = orchestrator
        .run(job, &mut events, &StopHandle::new())
        .await
        .expect_err("15 requested against 12 available must be refused");

    assert_eq!(
        err,
        BatchError::InsufficientBalance {
            requested: Some(dec("15")),
            available: dec("12"),
        }
    );
    assert!(err.to_string().contains("15"));
    assert!(events.is_empty());
    assert_eq!(exchange.call_count(), 0);
    assert!(!orchestrator.is_running());
    Ok(())
}

#[tokio::test]
async fn remaining_balance_never_goes_negative() -> Result<()> {
    init_tracing();
    let amounts = ["0.3", "0.0001", "1.25", "0.4499"];
    let exchange = MockExchange::new();
    let orchestrator = BatchOrchestrator::new(exchange.as_client());

    let job = quick_job(&evm_lines(&amounts), "2")?;
    let mut events: Vec<StatusEvent> = Vec::new();
    let report = orchestrator
        .run(job, &mut events, &StopHandle::new())
        .await?;

    let mut running = dec("2");
    for event in &events {
        if let ItemOutcome::Success { .. } = event.outcome {
            running -= event.amount;
        }
        assert!(running >= Decimal::ZERO);
    }
    assert_eq!(running, report.remaining_balance);
    assert_eq!(report.remaining_balance, Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn concurrent_run_is_rejected() -> Result<()> {
    init_tracing();
    let exchange = MockExchange::gated(Vec::new());
    let orchestrator = BatchOrchestrator::new(exchange.as_client());
    let stop = StopHandle::new();

    let first_job = quick_job(&evm_lines(&["1"]), "5")?;
    let second_job = quick_job(&evm_lines(&["1"]), "5")?;

    let mut first_events: Vec<StatusEvent> = Vec::new();
    let (first, second) = tokio::join!(
        orchestrator.run(first_job, &mut first_events, &stop),
        async {
            exchange.wait_for_call().await;
            let second = orchestrator.run(second_job, &mut NullSink, &stop).await;
            exchange.release();
            second
        }
    );

    assert_eq!(second.expect_err("second run must be refused"), BatchError::RunInProgress);
    assert_eq!(first?.state, TerminalState::Completed);
    assert_eq!(exchange.call_count(), 1);
    assert_eq!(orchestrator.telemetry().snapshot().rejected_runs, 1);

    // The flag is released once the first run finishes.
    let again = quick_job(&evm_lines(&["1"]), "5")?;
    let mut sink = NullSink;
    let (report, ()) = tokio::join!(
        orchestrator.run(again, &mut sink, &stop),
        async {
            exchange.wait_for_call().await;
            exchange.release();
        }
    );
    assert!(report?.is_completed());
    Ok(())
}

#[tokio::test]
async fn channel_sink_streams_events_to_another_task() -> Result<()> {
    init_tracing();
    let exchange = MockExchange::new();
    let orchestrator = BatchOrchestrator::new(exchange.as_client());
    let (mut tx, mut rx) = mpsc::unbounded_channel::<StatusEvent>();

    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            seen.push(event.index);
        }
        seen
    });

    let job = quick_job(&evm_lines(&["1", "1", "1"]), "3")?;
    let report = orchestrator.run(job, &mut tx, &StopHandle::new()).await?;
    drop(tx);

    assert!(report.is_completed());
    assert_eq!(collector.await?, vec![0, 1, 2]);
    Ok(())
}

#[tokio::test]
async fn report_serializes_terminal_state() -> Result<()> {
    init_tracing();
    let orchestrator = BatchOrchestrator::new(MockExchange::new().as_client());
    let job = quick_job(&evm_lines(&["1"]), "1")?;
    let report = orchestrator.run(job, &mut NullSink, &StopHandle::new()).await?;

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["state"]["state"], "completed");
    assert_eq!(json["chain"], "USDT-ERC20");
    assert_eq!(json["events"][0]["outcome"]["status"], "success");
    Ok(())
}
