use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rocket_flight::*;

const DEMO_SPECS: &str = include_str!("../data/rocket_specs.json");

#[derive(Parser)]
#[command(name = "rocket-flight")]
#[command(about = "Model-rocket flight simulator")]
#[command(version)]
struct Cli {
    /// Design file (JSON); the bundled demo rocket when omitted
    #[arg(long)]
    specs: Option<PathBuf>,

    /// Motor key from the design file, or a class/designation from the built-in catalog
    #[arg(long, default_value = "K550W")]
    motor: String,

    /// Material key from the design file
    #[arg(long, default_value = "fiberglass")]
    material: String,

    /// Parachute size: small, medium or large
    #[arg(long, default_value = "medium")]
    parachute: String,

    /// Launch rail tilt from vertical, degrees
    #[arg(long, default_value_t = 0.0)]
    launch_angle: f64,

    /// Launch rail length, meters
    #[arg(long, default_value_t = constants::DEFAULT_RAIL_LENGTH)]
    rail_length: f64,

    /// Use the fixed-step Euler integrator with this step (s)
    #[arg(long, value_name = "DT")]
    fixed_step: Option<f64>,

    /// Trajectory rows printed in the report
    #[arg(long, default_value_t = 20)]
    samples: usize,

    /// Print the full series as JSON instead of the report
    #[arg(long)]
    json: bool,
}

fn load_configuration(cli: &Cli) -> anyhow::Result<RocketConfiguration> {
    let text = match &cli.specs {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading design file {}", path.display()))?,
        None => DEMO_SPECS.to_string(),
    };
    let specs = RocketSpecs::from_json(&text).context("parsing design file")?;

    let in_specs = specs
        .motor_names()
        .any(|name| name.eq_ignore_ascii_case(&cli.motor));
    let config = if in_specs {
        specs.configuration(&cli.motor, &cli.material, &cli.parachute)?
    } else {
        let catalog = MotorCatalog::builtin();
        let motor = catalog.get(&cli.motor).with_context(|| {
            let known: Vec<&str> = specs.motor_names().chain(catalog.ids()).collect();
            format!("motor `{}` not found (known: {})", cli.motor, known.join(", "))
        })?;
        specs.configuration_with_motor(motor.clone(), &cli.material, &cli.parachute)?
    };
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_configuration(&cli)?;

    let aero = aero_properties(&config).context("computing aerodynamic properties")?;
    tracing::info!(
        cg = aero.cg,
        cp = aero.cp,
        cd = aero.cd,
        static_margin = aero.static_margin,
        "design loaded"
    );
    if !aero.is_stable() {
        tracing::warn!(
            static_margin = aero.static_margin,
            "center of pressure ahead of center of gravity"
        );
    }

    let settings = SimulationSettings::default()
        .with_launch_angle(cli.launch_angle)
        .with_rail_length(cli.rail_length);
    let series = match cli.fixed_step {
        Some(dt) if dt <= 0.0 => bail!("--fixed-step must be positive, got {dt}"),
        Some(dt) => EulerSimulator::new(&config)
            .with_settings(settings)
            .with_time_step(dt)
            .run(),
        None => Simulation::new(&config).with_settings(settings).run(),
    }
    .context("simulating flight")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        println!("--- Design ---");
        println!(
            "Mass: {:.3} kg loaded, {:.3} kg dry",
            config.initial_mass(),
            config.dry_mass()
        );
        println!(
            "CG: {:.3} m, CP: {:.3} m, Cd: {:.3}, static margin: {:.2} cal\n",
            aero.cg, aero.cp, aero.cd, aero.static_margin
        );
        print!("{}", series.report(cli.samples));
    }

    Ok(())
}
