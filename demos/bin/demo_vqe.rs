//! VQE demo: train the hardware-efficient ansatz to the H₂ ground state.

use alsvid_compile::{OptLevel, PrePass};
use alsvid_demos::{h2_hamiltonian, hardware_efficient_ansatz, num_parameters, print_header};
use alsvid_engine::{CpuRegister, Register};
use alsvid_grad::{Adam, GradientDescent, OptimizeOutcome, Spsa, adjoint, evaluate, parameter_shift};
use anyhow::{Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "demo-vqe")]
#[command(about = "Variational ground-state search for the H2 molecule")]
struct Args {
    /// Optimizer: gd, adam or spsa
    #[arg(short, long, default_value = "gd")]
    optimizer: String,

    /// Gradient method: shift or adjoint (ignored by spsa)
    #[arg(short, long, default_value = "shift")]
    method: String,

    /// Maximum optimizer iterations
    #[arg(short, long, default_value_t = 100)]
    iterations: usize,

    /// Learning rate (gd/adam) or SPSA step gain
    #[arg(short, long, default_value_t = 0.1)]
    learning_rate: f64,

    /// Ansatz repetitions
    #[arg(short, long, default_value_t = 1)]
    reps: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    print_header("VQE: H2 ground state");
    let observable = h2_hamiltonian();
    let circuit = hardware_efficient_ansatz(2, args.reps);
    let circuit = PrePass::with_level(OptLevel::O2).run(&circuit)?;
    let tape = circuit.to_tape();
    let initial = vec![0.0; num_parameters(2, args.reps)];
    println!(
        "ansatz: {} ops after pre-pass, {} trainable parameters",
        circuit.len(),
        tape.num_parameters()
    );

    let reg = CpuRegister::new(2)?;
    let energy = |theta: &[f64]| evaluate(&mut reg.fork(), &tape, theta, &observable);
    let use_adjoint = match args.method.as_str() {
        "adjoint" => true,
        "shift" => false,
        other => bail!("unknown gradient method '{other}'"),
    };
    let gradient = |theta: &[f64]| {
        if use_adjoint {
            adjoint(&mut reg.fork(), &tape, theta, &observable)
        } else {
            parameter_shift(&mut reg.fork(), &tape, theta, &observable)
        }
    };

    let outcome: OptimizeOutcome = match args.optimizer.as_str() {
        "gd" => GradientDescent::new()
            .with_learning_rate(args.learning_rate)
            .with_max_iterations(args.iterations)
            .minimize(energy, gradient, initial)?,
        "adam" => Adam::new()
            .with_learning_rate(args.learning_rate)
            .with_max_iterations(args.iterations)
            .minimize(energy, gradient, initial)?,
        "spsa" => Spsa::new()
            .with_step_size(args.learning_rate)
            .with_max_iterations(args.iterations)
            .with_seed(7)
            .minimize(energy, initial)?,
        other => bail!("unknown optimizer '{other}'"),
    };

    report(&outcome);
    Ok(())
}

fn report(outcome: &OptimizeOutcome) {
    print_header("Result");
    println!("iterations:  {}", outcome.iterations);
    println!("best energy: {:+.5} Hartree", outcome.best_energy);
    println!("parameters:  {:?}", outcome.best_params);
    if outcome.converged {
        println!("converged within tolerance");
    }
    if outcome.aborted_non_finite {
        println!("aborted on non-finite energy; best parameters reported");
    }
    if let (Some(first), Some(last)) =
        (outcome.energy_history.first(), outcome.energy_history.last())
    {
        println!("energy trajectory: {first:+.5} -> {last:+.5}");
    }
}
