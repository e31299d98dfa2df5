//! Thin terminal adapter over the session controller.
//!
//! Renders controller snapshots as plain text and turns typed lines into
//! intents; all session logic lives in the library. Plain input goes to the
//! simulated patient, slash commands drive the lifecycle.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use consultsim::{config, BackendClient, ControllerError, SessionController};

type Controller = SessionController<Arc<BackendClient>, Arc<BackendClient>>;

#[tokio::main]
async fn main() {
    consultsim::init_tracing();

    let client = match BackendClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(error) => {
            eprintln!("Failed to configure backend client: {error}");
            std::process::exit(1);
        }
    };
    tracing::info!(backend = client.base_url(), "{} v{}", config::APP_NAME, config::APP_VERSION);

    let controller: Arc<Controller> = Arc::new(SessionController::new(
        Arc::clone(&client),
        client,
        config::caller_id(),
    ));

    println!("AI patient simulator. /start begins a consultation; /help lists commands.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim();

        match line.split_whitespace().next() {
            Some("/quit") => break,
            Some("/help") => print_help(),
            Some("/start") => start(&controller).await,
            Some("/analyze") => analyze(&controller).await,
            Some("/end") => {
                end(&controller, line.trim_start_matches("/end").trim()).await;
            }
            Some("/history") => history(&controller).await,
            Some(cmd) if cmd.starts_with('/') => {
                println!("Unknown command {cmd}. /help lists commands.");
            }
            _ => send(&controller, line).await,
        }
    }

    // Best-effort archive of an abandoned session; never blocks exit
    // beyond a short grace for the request to reach the wire.
    controller.teardown();
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
}

fn print_help() {
    println!("  /start            begin a new consultation");
    println!("  /analyze          possible conditions from disclosed findings");
    println!("  /end dx | rx      end the session with a diagnosis and prescriptions");
    println!("  /history          list archived consultations");
    println!("  /quit             leave (abandoned sessions are archived best-effort)");
    println!("  anything else     say it to the patient");
}

async fn start(controller: &Controller) {
    match controller.start_session().await {
        Ok(snap) => {
            let p = &snap.patient;
            println!("Patient: {} ({}, {})", p.name, p.age_range, p.sex);
            if !p.presenting_summary.is_empty() {
                println!("Presenting: {}", p.presenting_summary);
            }
        }
        Err(error) => println!("Could not start a session: {error}"),
    }
}

async fn send(controller: &Controller, text: &str) {
    let before = controller
        .snapshot()
        .map(|snap| snap.transcript.len())
        .unwrap_or(0);

    if let Err(error) = controller.send_message(text).await {
        println!("{error}");
        return;
    }

    if let Some(snap) = controller.snapshot() {
        for message in &snap.transcript[before..] {
            if message.sender != consultsim::models::Sender::Doctor {
                println!("[{}] {}", message.sender, message.text);
            }
        }
        if !snap.disclosed_findings.is_empty() {
            println!("  findings: {}", snap.disclosed_findings.join(", "));
        }
        if snap.needs_escalation {
            println!("  ⚠ the patient may need urgent care");
        }
        if snap.offer_analysis {
            println!("  (enough findings for /analyze)");
        }
    }
}

async fn analyze(controller: &Controller) {
    match controller.request_analysis().await {
        Ok(result) => {
            println!("Possible conditions (from {} findings):", result.as_of_count);
            for condition in &result.conditions {
                println!("  {} [{}] {}", condition.name, condition.confidence_tier, condition.rationale);
            }
        }
        Err(ControllerError::InsufficientEvidence { have, need }) => {
            println!("Not enough findings yet ({have}/{need}). Keep asking questions.");
        }
        Err(error) => println!("{error}"),
    }
}

async fn end(controller: &Controller, args: &str) {
    let (diagnosis, prescriptions) = match args.split_once('|') {
        Some((dx, rx)) => (dx.trim(), rx.trim()),
        None => (args, ""),
    };
    match controller.end_session(diagnosis, prescriptions).await {
        Ok(()) => println!("Session archived."),
        Err(error) => println!("Could not end the session: {error}"),
    }
}

async fn history(controller: &Controller) {
    match controller.history().await {
        Ok(records) if records.is_empty() => println!("No archived consultations."),
        Ok(records) => {
            for record in records {
                println!(
                    "{}  {} ({}, {})  Dx: {}",
                    record.timestamp.format("%Y-%m-%d %H:%M"),
                    record.patient_name,
                    record.patient_age,
                    record.patient_sex,
                    record.final_diagnosis,
                );
            }
        }
        Err(error) => println!("Could not load history: {error}"),
    }
}
