use super::format_number;
use crate::config::CliConfig;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::{Confirm, Input, Select};
use hilo_game::{
    create_game, DeckOrder, Direction, EffectReport, GameError, GameRules, GuessOutcome,
    HigherLowerGame, LedgerLink, SessionState, SettlementOutcome, TerminationReason,
};
use hilo_ledger::{establish, Amount, GatewayStatus, LocalConnector};
use std::path::{Path, PathBuf};

const CHOICES: [(&str, Direction); 2] = [("Higher", Direction::Higher), ("Lower", Direction::Lower)];

pub async fn play(
    data_dir: &Path,
    config: &CliConfig,
    wager: Option<String>,
    seed: Option<u64>,
    catalogue: Option<PathBuf>,
) -> anyhow::Result<()> {
    let catalogue = config.catalogue(catalogue.as_deref())?;
    let gateway_config = config.gateway_config();

    let status = establish(&LocalConnector::new(data_dir), &gateway_config).await;
    if let GatewayStatus::Offline { reason } = &status {
        println!("Ledger offline ({}). Playing without payouts.", reason);
    }
    let link = LedgerLink::from_status(&status, &gateway_config);

    let order = match seed {
        Some(seed) => DeckOrder::seeded(seed),
        None => DeckOrder::random(),
    };
    let mut game = create_game(catalogue, order, config.rules.clone(), link)?;

    match game.settlement().account_id() {
        Some(account_id) => println!("Playing as {}", account_id),
        None if game.settlement().is_online() => {
            println!("Not signed in. Winnings will not be paid out.");
            println!("Sign in with: hilo sign-in <account-id>");
        }
        None => {}
    }
    println!("Best score: {}", game.load_best_score().await);
    print_payout_schedule(game.settlement().rules());

    let mut preset = wager;
    loop {
        let amount = take_wager(&mut game, preset.take())?;
        let state = game.start_game()?;
        println!();
        println!("Wager {} accepted. Good luck!", amount);
        tracing::debug!("Playing session {}", state.session_id);

        play_session(&mut game)?;

        let outcome = game.settle()?;
        print_outcome(&outcome, &game.state(), game.settlement().rules());

        print_failed_effects(game.drain_finished_settlement());

        let again = Confirm::new()
            .with_prompt("Play again?")
            .default(true)
            .interact()?;
        if !again {
            break;
        }
    }

    if game.settlement().pending_effects() > 0 {
        println!("Waiting for settlement to finish...");
    }
    print_failed_effects(game.drain_settlement().await);

    Ok(())
}

fn print_failed_effects(reports: Vec<EffectReport>) {
    for report in reports {
        if let Err(e) = &report.result {
            println!("Note: {}", e);
        }
    }
}

/// Prompt until the coordinator accepts a wager.
fn take_wager(game: &mut HigherLowerGame, preset: Option<String>) -> anyhow::Result<Amount> {
    let mut preset = preset;
    loop {
        let input = match preset.take() {
            Some(input) => input,
            None => Input::<String>::new()
                .with_prompt(format!(
                    "Wager (minimum {})",
                    game.settlement().rules().min_wager
                ))
                .interact_text()?,
        };

        let accepted = HigherLowerGame::parse_wager(&input)
            .and_then(|amount| game.accept_wager(amount).map(|_| amount));
        match accepted {
            Ok(amount) => return Ok(amount),
            Err(e @ GameError::InvalidWager(_)) => println!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }
}

fn play_session(game: &mut HigherLowerGame) -> anyhow::Result<()> {
    let labels: Vec<&str> = CHOICES.iter().map(|(label, _)| *label).collect();

    loop {
        let state = game.state();
        if state.is_game_over {
            return Ok(());
        }
        let Some(round) = game.round().cloned() else {
            return Ok(());
        };

        println!();
        println!(
            "Round {}/{}   Score {}   Best {}",
            state.round_index,
            state.max_rounds,
            state.score,
            state.display_best_score()
        );
        println!(
            "  {} has {} monthly searches",
            round.left.label,
            format_number(round.left.metric)
        );

        let pick = Select::new()
            .with_prompt(format!(
                "{} has higher or lower searches than {}?",
                round.right.label, round.left.label
            ))
            .items(&labels)
            .default(0)
            .interact()?;

        let outcome = game.make_guess(CHOICES[pick].1);
        println!(
            "  {} has {} monthly searches",
            round.right.label,
            format_number(round.right.metric)
        );

        match outcome {
            GuessOutcome::Correct => {
                println!("Correct!");
                game.next_round()?;
            }
            GuessOutcome::Incorrect => {
                println!("Wrong, it was {}.", round.correct_direction());
            }
            GuessOutcome::Ignored => {}
        }
    }
}

fn print_payout_schedule(rules: &GameRules) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Score", "Payout"]);

    for score in rules.win_threshold..=rules.max_rounds {
        if let Some(multiplier) = rules.multiplier_for(score) {
            table.add_row(vec![score.to_string(), format!("{} wager", multiplier)]);
        }
    }

    println!(
        "Guess right {} times in a row (of {} rounds) to win:",
        rules.win_threshold, rules.max_rounds
    );
    println!("{}", table);
}

fn print_outcome(outcome: &SettlementOutcome, state: &SessionState, rules: &GameRules) {
    println!();
    match state.termination {
        Some(TerminationReason::RoundLimit) => println!("All {} rounds cleared!", state.max_rounds),
        Some(TerminationReason::DeckExhausted) => println!("Out of terms to compare."),
        Some(TerminationReason::WrongGuess) | None => println!("Game over."),
    }
    println!("Final score: {}", outcome.score);

    if outcome.won {
        println!("You won {}!", outcome.payout);
    } else {
        println!(
            "Score {} to win. Better luck next time.",
            rules.win_threshold
        );
    }

    if outcome.new_best_score {
        println!("New best score!");
    }
}
