// Copyright (c) 2024 Botho Foundation

//! Plain-text reports for the simulator.

use crate::{
    runner::{Simulation, StepResult},
    scenario::Step,
};
use chrono::{DateTime, Utc};
use gfox_token::{Amount, BaseCurrency, Direction, FeeQuote, LiquifyOutcome, TaxRate};

/// Render `amount` base units as a decimal with `decimals` places, trimming
/// trailing zeros.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let unit = 10u128.pow(u32::from(decimals.min(38)));
    let whole = amount / unit;
    let frac = amount % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

fn format_time(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn describe(result: &StepResult, decimals: u8) -> String {
    match result {
        StepResult::Settled(receipt) => format!(
            "{} received {} (fee {})",
            receipt.direction,
            format_units(receipt.received, decimals),
            format_units(receipt.fee, decimals)
        ),
        StepResult::Traded {
            receipt,
            amount_out,
        } => format!(
            "{} out {} (fee {})",
            receipt.direction,
            format_units(*amount_out, decimals),
            format_units(receipt.fee, decimals)
        ),
        StepResult::Done => "ok".to_string(),
        StepResult::Rejected(reason) => format!("rejected: {reason}"),
    }
}

fn describe_liquify(outcome: &LiquifyOutcome, decimals: u8) -> Option<String> {
    match outcome {
        LiquifyOutcome::Completed(report) => Some(format!(
            "liquified {} tokens for {} base, added {} tokens / {} base, paid {} + {}",
            format_units(report.tokens_swapped, decimals),
            format_units(report.base_received, decimals),
            format_units(report.tokens_added, decimals),
            format_units(report.base_added, decimals),
            format_units(report.marketing_base, decimals),
            format_units(report.ecosystem_base, decimals),
        )),
        LiquifyOutcome::Failed(reason) => Some(format!("liquify failed: {reason}")),
        _ => None,
    }
}

/// Print each step and its result.
pub fn print_steps(steps: &[Step], results: &[StepResult], decimals: u8) {
    println!("Steps");
    println!("=====");
    for (index, (step, result)) in steps.iter().zip(results).enumerate() {
        println!("{:>4}  {:<40} {}", index, step.to_string(), describe(result, decimals));
        if let Some(liquify) = result.liquify().and_then(|o| describe_liquify(o, decimals)) {
            println!("{:>4}  {:<40} {}", "", "", liquify);
        }
    }
    println!();
}

/// Print balances and contract state at the end of a run.
pub fn print_summary(sim: &Simulation) {
    let token = sim.token();
    let decimals = token.decimals();

    println!("Final State ({})", format_time(sim.now()));
    println!("===========");
    println!("{:<18} {:>28} {:>24}", "Account", token.symbol(), "Base");
    println!("{}", "-".repeat(72));
    for (label, address) in sim.labels() {
        println!(
            "{:<18} {:>28} {:>24}",
            label,
            format_units(token.balance_of(address), decimals),
            format_units(token.base().balance_of(address), decimals)
        );
    }
    println!();

    let holders = token.holders();
    println!("Total supply:        {}", format_units(token.total_supply(), decimals));
    println!(
        "Liquidity reserves:  {}",
        format_units(token.liquidity_reserves(), decimals)
    );
    println!(
        "LP held by holder:   {}",
        format_units(
            token.amm().lp_balance(&token.pair(), &holders.liquidity),
            decimals
        )
    );
    println!("Tax enabled:         {}", token.tax_enabled());
    println!("Swap state:          {}", token.swap_state());
}

/// Print the fee breakdown of a taxed trade.
pub fn print_quote(
    direction: Direction,
    rate: TaxRate,
    quote: FeeQuote,
    amount: Amount,
    decimals: u8,
) {
    println!("Fee Quote ({direction})");
    println!("=========");
    println!("Amount:        {}", format_units(amount, decimals));
    println!(
        "Rate:          {} bps (liquidity {}, marketing {}, ecosystem {})",
        rate.total_bps(),
        rate.liquidity,
        rate.marketing,
        rate.ecosystem
    );
    println!("Fee:           {}", format_units(quote.fee, decimals));
    println!(
        "  Liquidity:   {}",
        format_units(quote.liquidity_share, decimals)
    );
    println!(
        "Received:      {}",
        format_units(amount.saturating_sub(quote.fee), decimals)
    );
}
