//! Entanglement demo: Bell pair and GHZ amplitudes plus sampled
//! measurement statistics.

use alsvid_demos::print_header;
use alsvid_engine::{CpuRegister, Register};
use alsvid_ir::Circuit;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "demo-bell")]
#[command(about = "Bell and GHZ states with measurement sampling")]
struct Args {
    /// GHZ chain length
    #[arg(short, long, default_value_t = 3)]
    qubits: u32,

    /// Measurement shots
    #[arg(short, long, default_value_t = 1000)]
    shots: usize,

    /// Measurement RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    print_header("Bell pair");
    let mut reg = CpuRegister::with_seed(2, args.seed)?;
    reg.run(&Circuit::bell())?;
    dump_amplitudes(&reg);

    print_header(&format!("GHZ-{}", args.qubits));
    let circuit = Circuit::ghz(args.qubits);
    let mut reg = CpuRegister::with_seed(args.qubits, args.seed)?;
    reg.run(&circuit)?;
    dump_amplitudes(&reg);

    print_header(&format!("{} shots on GHZ-{}", args.shots, args.qubits));
    let mut all_zero = 0usize;
    let mut all_one = 0usize;
    for _ in 0..args.shots {
        reg.reset();
        reg.run(&circuit)?;
        let first = reg.measure(0)?;
        let mut agreed = true;
        for q in 1..args.qubits {
            agreed &= reg.measure(q)? == first;
        }
        assert!(agreed, "GHZ shot decohered across qubits");
        if first { all_one += 1 } else { all_zero += 1 }
    }
    println!("all-zeros: {all_zero}");
    println!("all-ones:  {all_one}");
    Ok(())
}

fn dump_amplitudes(reg: &CpuRegister) {
    let n = reg.num_qubits();
    for (index, amp) in reg.local_amplitudes().iter().enumerate() {
        let p = amp.norm_sqr();
        if p > 1e-12 {
            println!("|{index:0width$b}>  {:+.4}{:+.4}i   p = {p:.4}", amp.re, amp.im, width = n);
        }
    }
}
