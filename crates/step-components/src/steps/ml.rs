//! Pipeline de "ML" sintético: datos de temperatura -> limpieza -> análisis ->
//! reporte.
//!
//! Los pasos no transportan los datos entre sí, sólo un resumen textual; cada
//! uno muestrea sus propios números. Con `seed: Some(_)` el muestreo es
//! reproducible (`StdRng::seed_from_u64`); con `None` usa entropía del
//! sistema. Las normales salen de `rand_distr::Normal`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use step_core::{component, CoreEngineError};

pub const SAMPLE_COUNT: usize = 50;
const MEAN_TEMPERATURE: f64 = 20.0;
const TEMPERATURE_SD: f64 = 5.0;

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn normal(mean: f64, sd: f64) -> Result<Normal<f64>, CoreEngineError> {
    Normal::new(mean, sd).map_err(|e| CoreEngineError::Internal(format!("normal({mean}, {sd}): {e}")))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Lecturas de temperatura redondeadas a 2 decimales.
pub fn sample_temperatures(seed: Option<u64>) -> Result<Vec<f64>, CoreEngineError> {
    let dist = normal(MEAN_TEMPERATURE, TEMPERATURE_SD)?;
    let mut rng = rng_for(seed);
    Ok((0..SAMPLE_COUNT).map(|_| round2(dist.sample(&mut rng))).collect())
}

component! {
    component GenerateData {
        name: "generate_data_op",
        description: "Generate synthetic temperature readings",
        inputs: [],
        fields { seed: Option<u64> },
        run(me) {
            let data = sample_temperatures(me.seed)?;
            let avg = data.iter().sum::<f64>() / data.len() as f64;
            log::info!(target: "step", "Generated {} data points", data.len());
            log::debug!(target: "step", "Sample data: {:?}", &data[..5]);
            format!("Generated {} samples, avg: {:.2}°C", data.len(), avg)
        }
    }
}

component! {
    component CleanData {
        name: "clean_data_op",
        description: "Drop outlier readings",
        inputs: [data_summary],
        fields { seed: Option<u64> },
        run(me) {
            log::info!(target: "step", "Cleaning data: {data_summary}");
            let outliers: usize = rng_for(me.seed).gen_range(2..=5);
            let valid = SAMPLE_COUNT - outliers;
            log::info!(target: "step", "Removed {outliers} outliers");
            format!("Cleaned data: {valid} valid records")
        }
    }
}

component! {
    component AnalyzeData {
        name: "analyze_data_op",
        description: "Compute summary statistics over the cleaned data",
        inputs: [clean_data_summary],
        fields { seed: Option<u64> },
        run(me) {
            log::info!(target: "step", "Analyzing: {clean_data_summary}");
            let mut rng = rng_for(me.seed);
            let mean = round2(normal(20.0, 2.0)?.sample(&mut rng));
            let sd = round2(normal(3.0, 1.0)?.sample(&mut rng).abs());
            let correlation = (rng.gen_range(0.7_f64..0.95) * 1000.0).round() / 1000.0;
            log::info!(target: "step", "Data correlation: {correlation}");
            format!("Analysis: mean={mean}°C, std={sd}°C, quality={:.1}%", correlation * 100.0)
        }
    }
}

component! {
    component GenerateReport {
        name: "generate_report_op",
        description: "Log the final pipeline report",
        inputs: [analysis_summary],
        run(_me) {
            let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S");
            log::info!(target: "step", "==================================================");
            log::info!(target: "step", "KFP v2 PIPELINE EXECUTION REPORT");
            log::info!(target: "step", "Generated at: {now} UTC");
            log::info!(target: "step", "Results: {analysis_summary}");
            log::info!(target: "step", "Status: completed");
            log::info!(target: "step", "==================================================");
            "KFP v2 Pipeline execution completed successfully".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use step_core::{ComponentDefinition, StepContext, StepRunResult};

    use super::*;

    fn output(result: StepRunResult) -> String {
        match result {
            StepRunResult::Success { output } => output,
            StepRunResult::Failure { error } => panic!("fallo inesperado: {error}"),
        }
    }

    fn ctx(key: &str, value: &str) -> StepContext {
        let mut inputs = IndexMap::new();
        inputs.insert(key.to_string(), value.to_string());
        StepContext::new("t", inputs)
    }

    #[test]
    fn seeded_samples_are_reproducible_and_rounded() {
        let a = sample_temperatures(Some(7)).expect("muestras");
        assert_eq!(a, sample_temperatures(Some(7)).expect("muestras"));
        assert_eq!(a.len(), SAMPLE_COUNT);
        assert!(a.iter().all(|x| (x * 100.0 - (x * 100.0).round()).abs() < 1e-6));
    }

    #[test]
    fn invalid_normal_is_an_error_not_a_panic() {
        assert!(normal(20.0, 5.0).is_ok());
        assert!(matches!(normal(0.0, -1.0), Err(CoreEngineError::Internal(_))));
    }

    #[test]
    fn clean_keeps_between_45_and_48_records() {
        for seed in 0..20 {
            let out = output(CleanData::new(Some(seed)).run(&ctx("data_summary", "x")));
            let valid: usize = out.trim_start_matches("Cleaned data: ")
                                  .trim_end_matches(" valid records")
                                  .parse()
                                  .expect("número");
            assert!((45..=48).contains(&valid), "{out}");
        }
    }

    #[test]
    fn generate_and_analyze_formats() {
        let generated = output(GenerateData::new(Some(1)).run(&StepContext::default()));
        assert!(generated.starts_with("Generated 50 samples, avg: ") && generated.ends_with("°C"), "{generated}");

        let analysis = output(AnalyzeData::new(Some(1)).run(&ctx("clean_data_summary", "x")));
        assert!(analysis.starts_with("Analysis: mean="), "{analysis}");
        assert!(analysis.ends_with('%'));
        assert_eq!(analysis, output(AnalyzeData::new(Some(1)).run(&ctx("clean_data_summary", "x"))));

        let report = output(GenerateReport::new().run(&ctx("analysis_summary", &analysis)));
        assert_eq!(report, "KFP v2 Pipeline execution completed successfully");
    }
}
