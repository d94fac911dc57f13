// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output subscription through the engine

use super::*;

#[tokio::test]
async fn late_subscriber_gets_full_transcript_then_end() {
    let ctx = setup();
    ctx.process.script(
        "build",
        FakeScript::exits(0).output(["compiling\n", "linking\n", "done\n"]),
    );
    let started = ctx
        .engine
        .start_execution(shell_request("p1", "build"))
        .await
        .unwrap();
    ctx.engine.wait(&started.id).await.unwrap();

    let mut sub = ctx.engine.subscribe(&started.id).unwrap();
    let mut seen = Vec::new();
    while let Some(chunk) = sub.next().await {
        seen.push((chunk.seq, chunk.text.to_string()));
    }

    assert_eq!(
        seen,
        vec![
            (0, "compiling\n".to_string()),
            (1, "linking\n".to_string()),
            (2, "done\n".to_string()),
        ]
    );
    assert_eq!(
        ctx.engine.transcript(&started.id).unwrap(),
        "compiling\nlinking\ndone\n"
    );
}

#[tokio::test]
async fn live_subscribers_all_see_the_same_stream() {
    let ctx = setup();
    ctx.process
        .script("tail", FakeScript::exits(0).output(["a\n", "b\n"]).held());
    let started = ctx
        .engine
        .start_execution(shell_request("p1", "tail"))
        .await
        .unwrap();

    let first = ctx.engine.subscribe(&started.id).unwrap();
    let second = ctx.engine.subscribe(&started.id).unwrap();
    let readers = tokio::spawn(async move {
        (first.read_to_end().await, second.read_to_end().await)
    });

    ctx.process.release("tail");
    let (one, two) = readers.await.unwrap();

    assert_eq!(one, "a\nb\n");
    assert_eq!(two, one);
}

#[tokio::test]
async fn subscribe_to_pending_execution_waits_for_it_to_run() {
    let ctx = setup();
    start_held(&ctx, "p1", "a").await;
    ctx.process.script("b", FakeScript::exits(0).output(["from b\n"]));
    let b = ctx
        .engine
        .start_execution(shell_request("p1", "b"))
        .await
        .unwrap();

    let sub = ctx.engine.subscribe(&b.id).unwrap();
    let reader = tokio::spawn(sub.read_to_end());
    ctx.process.release("a");

    assert_eq!(reader.await.unwrap(), "from b\n");
}

#[tokio::test]
async fn subscribe_unknown_execution_is_not_found() {
    let ctx = setup();
    let id = ExecutionId::new("ghost");
    assert!(matches!(
        ctx.engine.subscribe(&id),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        ctx.engine.transcript(&id),
        Err(EngineError::NotFound(_))
    ));
}
