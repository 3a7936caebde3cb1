//! Load testing for the multiplexer.

use std::time::{Duration, Instant};

use wsmux::{Dispatcher, Frame, Request, ResponseSink};

mod common;

fn echo_dispatcher() -> Dispatcher {
    Dispatcher::builder()
        .register_prefix("/echo/", |sink: ResponseSink, req: Request| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            sink.write_text(req.target().to_string())?;
            Ok(())
        })
        .build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_single_session_multiplexing() {
    let server = common::start_server(echo_dispatcher()).await;
    let mut ws = common::connect(server.local_addr()).await;

    let total = 500;
    let start = Instant::now();
    for i in 0..total {
        common::send(&mut ws, &format!("/echo/{}", i), "").await;
    }

    let mut seen = vec![false; total];
    for _ in 0..total {
        let frame = common::recv_frame(&mut ws, Duration::from_secs(5))
            .await
            .expect("missing reply");
        let Frame::Text(target) = frame else {
            panic!("expected text frame");
        };
        let i: usize = target.trim_start_matches("/echo/").parse().unwrap();
        assert!(!seen[i], "duplicate reply for {}", i);
        seen[i] = true;
    }
    let duration = start.elapsed();

    assert!(seen.iter().all(|s| *s));

    println!("\n--- Load Test Results ---");
    println!("Messages:       {}", total);
    println!("Total Duration: {:?}", duration);
    println!("Messages/sec:   {:.2}", total as f64 / duration.as_secs_f64());
    println!("-------------------------\n");

    server.stop(Duration::from_secs(5)).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_many_sessions() {
    let server = common::start_server(echo_dispatcher()).await;
    let addr = server.local_addr();

    let concurrency = 20;
    let messages_per_session = 25;
    let start = Instant::now();

    let mut tasks = Vec::new();
    for session in 0..concurrency {
        tasks.push(tokio::spawn(async move {
            let mut ws = common::connect(addr).await;
            let mut latencies = Vec::new();
            for i in 0..messages_per_session {
                let req_start = Instant::now();
                common::send(&mut ws, &format!("/echo/{}-{}", session, i), "").await;
                if common::recv_frame(&mut ws, Duration::from_secs(5)).await.is_some() {
                    latencies.push(req_start.elapsed());
                }
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }
    let duration = start.elapsed();
    let total = concurrency * messages_per_session;

    assert_eq!(all_latencies.len(), total);

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Sessions:       {}", concurrency);
    println!("Total Messages: {}", total);
    println!("Total Duration: {:?}", duration);
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    server.stop(Duration::from_secs(5)).await.unwrap();
}
