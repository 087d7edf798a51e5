use std::collections::BTreeMap;

use env_logger::Builder;
use evalkit::{
    matrix::DenseMatrix, ClusteringMetric, MetricError, MetricOptions, MultiOutput, RegressionMetric,
};
use log::info;

fn main() {
    Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = run() {
        eprintln!("Evaluation failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), MetricError> {
    evaluate_regression()?;
    evaluate_multi_output()?;
    evaluate_clustering()?;
    Ok(())
}

fn evaluate_regression() -> Result<(), MetricError> {
    let metric = RegressionMetric::builder()
        .y_true(vec![3.0, -0.5, 2.0, 7.0, 5.0, 6.0])
        .y_pred(vec![2.5, 0.0, 2.0, 8.0, 5.0, 6.0])
        .decimal(4)
        .build()?;

    let names = ["MAE", "MSE", "RMSE", "MAPE", "NSE", "R2s", "KGE", "A10", "GINI", "PCD"];
    let results = metric.get_metrics_by_list_names(&names, None)?;
    info!("Regression results:");
    for (name, value) in &results {
        info!("  {:<6} {}", name, value.display());
    }

    let nrmse = metric.evaluate("NRMSE", &MetricOptions::new().model(2))?;
    info!("  NRMSE (range of y_true) {}", nrmse.display());
    Ok(())
}

fn evaluate_multi_output() -> Result<(), MetricError> {
    let y_true = DenseMatrix::new(3, 2, &[0.5, 1.0, -1.0, 1.0, 7.0, -6.0]);
    let y_pred = DenseMatrix::new(3, 2, &[0.0, 2.0, -1.0, 2.0, 8.0, -5.0]);
    let metric = RegressionMetric::builder().y_true(y_true).y_pred(y_pred).build()?;

    let mut request = BTreeMap::new();
    request.insert("MAE".to_string(), MetricOptions::new());
    request.insert("MSE".to_string(), MetricOptions::new().multi_output(MultiOutput::Mean));
    request.insert(
        "RMSE".to_string(),
        MetricOptions::new().multi_output(MultiOutput::Weights(vec![0.3, 0.7])),
    );
    let results = metric.get_metrics_by_dict(&request)?;
    info!("Multi-output results:");
    for (name, value) in &results {
        info!("  {:<6} {}", name, value.display());
    }
    Ok(())
}

fn evaluate_clustering() -> Result<(), MetricError> {
    let x = DenseMatrix::from_rows(&[
        vec![1.0, 2.0],
        vec![1.5, 1.8],
        vec![1.2, 2.2],
        vec![8.0, 8.0],
        vec![8.5, 7.5],
        vec![7.8, 8.3],
        vec![4.0, 5.0],
    ])?;
    let metric = ClusteringMetric::builder()
        .x(x)
        .y_true(vec!["a", "a", "a", "b", "b", "b", "b"])
        .y_pred(vec!["c1", "c1", "c1", "c2", "c2", "c2", "c1"])
        .build()?;

    let internal = ["BHI", "CHI", "DBI", "DI", "SI", "RSI", "DBCVI"];
    let external = ["MIS", "NMIS", "RaS", "FMS", "VMS", "JS", "PuS", "ES"];
    for (title, names) in [("Internal", &internal[..]), ("External", &external[..])] {
        info!("{} clustering results:", title);
        for name in names {
            let support = ClusteringMetric::<&str>::get_support(name)?;
            let value = metric.evaluate(name, &MetricOptions::new())?;
            info!("  {:<6} {:<12} best {} in {}", name, value.display(), support.best, support.range);
        }
    }
    Ok(())
}
