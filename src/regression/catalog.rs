use std::{collections::HashMap, sync::OnceLock};

use crate::error::MetricError;

use super::kernels::{self, ColumnKernel, ElementKernel};

/// Every regression metric the evaluator can compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegressionKind {
    ExplainedVarianceScore,
    MaxError,
    MeanAbsoluteError,
    MeanSquaredError,
    RootMeanSquaredError,
    MeanSquaredLogError,
    MedianAbsoluteError,
    MeanRelativeError,
    MeanAbsolutePercentageError,
    SymmetricMeanAbsolutePercentageError,
    MeanArctangentAbsolutePercentageError,
    MeanAbsoluteScaledError,
    NashSutcliffeEfficiency,
    WillmottIndex,
    PearsonCorrelationCoefficient,
    PearsonCorrelationCoefficientSquare,
    ConfidenceIndex,
    CoefficientOfDetermination,
    DeviationOfRunoffVolume,
    KlingGuptaEfficiency,
    GiniCoefficient,
    GiniCoefficientWiki,
    PredictionOfChangeInDirection,
    Entropy,
    CrossEntropy,
    KullbackLeiblerDivergence,
    JensenShannonDivergence,
    VarianceAccountedFor,
    RelativeAbsoluteError,
    A10Index,
    A20Index,
    NormalizedRootMeanSquareError,
    ResidualStandardError,
    SingleRelativeError,
    SingleAbsoluteError,
    SingleSquaredError,
    SingleSquaredLogError,
}

/// How a metric turns one column into a result.
#[derive(Clone, Copy)]
pub(crate) enum Formula {
    /// One score per column, then aggregated.
    Column(ColumnKernel),
    /// One value per sample, never aggregated.
    Element(ElementKernel),
}

use RegressionKind::*;

impl RegressionKind {
    pub const ALL: [RegressionKind; 37] = [
        ExplainedVarianceScore,
        MaxError,
        MeanAbsoluteError,
        MeanSquaredError,
        RootMeanSquaredError,
        MeanSquaredLogError,
        MedianAbsoluteError,
        MeanRelativeError,
        MeanAbsolutePercentageError,
        SymmetricMeanAbsolutePercentageError,
        MeanArctangentAbsolutePercentageError,
        MeanAbsoluteScaledError,
        NashSutcliffeEfficiency,
        WillmottIndex,
        PearsonCorrelationCoefficient,
        PearsonCorrelationCoefficientSquare,
        ConfidenceIndex,
        CoefficientOfDetermination,
        DeviationOfRunoffVolume,
        KlingGuptaEfficiency,
        GiniCoefficient,
        GiniCoefficientWiki,
        PredictionOfChangeInDirection,
        Entropy,
        CrossEntropy,
        KullbackLeiblerDivergence,
        JensenShannonDivergence,
        VarianceAccountedFor,
        RelativeAbsoluteError,
        A10Index,
        A20Index,
        NormalizedRootMeanSquareError,
        ResidualStandardError,
        SingleRelativeError,
        SingleAbsoluteError,
        SingleSquaredError,
        SingleSquaredLogError,
    ];

    /// Short code, e.g. `RMSE`.
    pub fn code(self) -> &'static str {
        match self {
            ExplainedVarianceScore => "EVS",
            MaxError => "ME",
            MeanAbsoluteError => "MAE",
            MeanSquaredError => "MSE",
            RootMeanSquaredError => "RMSE",
            MeanSquaredLogError => "MSLE",
            MedianAbsoluteError => "MedAE",
            MeanRelativeError => "MRE",
            MeanAbsolutePercentageError => "MAPE",
            SymmetricMeanAbsolutePercentageError => "SMAPE",
            MeanArctangentAbsolutePercentageError => "MAAPE",
            MeanAbsoluteScaledError => "MASE",
            NashSutcliffeEfficiency => "NSE",
            WillmottIndex => "WI",
            PearsonCorrelationCoefficient => "R",
            PearsonCorrelationCoefficientSquare => "R2s",
            ConfidenceIndex => "CI",
            CoefficientOfDetermination => "R2",
            DeviationOfRunoffVolume => "DRV",
            KlingGuptaEfficiency => "KGE",
            GiniCoefficient => "GINI",
            GiniCoefficientWiki => "GINI_WIKI",
            PredictionOfChangeInDirection => "PCD",
            Entropy => "E",
            CrossEntropy => "CE",
            KullbackLeiblerDivergence => "KLD",
            JensenShannonDivergence => "JSD",
            VarianceAccountedFor => "VAF",
            RelativeAbsoluteError => "RAE",
            A10Index => "A10",
            A20Index => "A20",
            NormalizedRootMeanSquareError => "NRMSE",
            ResidualStandardError => "RSE",
            SingleRelativeError => "RE",
            SingleAbsoluteError => "AE",
            SingleSquaredError => "SE",
            SingleSquaredLogError => "SLE",
        }
    }

    /// Long snake_case name, e.g. `root_mean_squared_error`.
    pub fn name(self) -> &'static str {
        match self {
            ExplainedVarianceScore => "explained_variance_score",
            MaxError => "max_error",
            MeanAbsoluteError => "mean_absolute_error",
            MeanSquaredError => "mean_squared_error",
            RootMeanSquaredError => "root_mean_squared_error",
            MeanSquaredLogError => "mean_squared_log_error",
            MedianAbsoluteError => "median_absolute_error",
            MeanRelativeError => "mean_relative_error",
            MeanAbsolutePercentageError => "mean_absolute_percentage_error",
            SymmetricMeanAbsolutePercentageError => "symmetric_mean_absolute_percentage_error",
            MeanArctangentAbsolutePercentageError => "mean_arctangent_absolute_percentage_error",
            MeanAbsoluteScaledError => "mean_absolute_scaled_error",
            NashSutcliffeEfficiency => "nash_sutcliffe_efficiency",
            WillmottIndex => "willmott_index",
            PearsonCorrelationCoefficient => "pearson_correlation_coefficient",
            PearsonCorrelationCoefficientSquare => "pearson_correlation_coefficient_square",
            ConfidenceIndex => "confidence_index",
            CoefficientOfDetermination => "coefficient_of_determination",
            DeviationOfRunoffVolume => "deviation_of_runoff_volume",
            KlingGuptaEfficiency => "kling_gupta_efficiency",
            GiniCoefficient => "gini_coefficient",
            GiniCoefficientWiki => "gini_coefficient_wiki",
            PredictionOfChangeInDirection => "prediction_of_change_in_direction",
            Entropy => "entropy",
            CrossEntropy => "cross_entropy",
            KullbackLeiblerDivergence => "kullback_leibler_divergence",
            JensenShannonDivergence => "jensen_shannon_divergence",
            VarianceAccountedFor => "variance_accounted_for",
            RelativeAbsoluteError => "relative_absolute_error",
            A10Index => "a10_index",
            A20Index => "a20_index",
            NormalizedRootMeanSquareError => "normalized_root_mean_square_error",
            ResidualStandardError => "residual_standard_error",
            SingleRelativeError => "single_relative_error",
            SingleAbsoluteError => "single_absolute_error",
            SingleSquaredError => "single_squared_error",
            SingleSquaredLogError => "single_squared_log_error",
        }
    }

    /// Default `(clean, positive_only)` filters for this metric.
    pub fn default_filters(self) -> (bool, bool) {
        match self {
            MeanSquaredLogError | Entropy | CrossEntropy | KullbackLeiblerDivergence | JensenShannonDivergence => {
                (true, true)
            }
            MeanRelativeError
            | MeanAbsolutePercentageError
            | SymmetricMeanAbsolutePercentageError
            | A10Index
            | A20Index
            | NormalizedRootMeanSquareError
            | ResidualStandardError => (true, false),
            SingleSquaredLogError => (false, true),
            _ => (false, false),
        }
    }

    pub(crate) fn formula(self) -> Formula {
        match self {
            ExplainedVarianceScore => Formula::Column(kernels::explained_variance),
            MaxError => Formula::Column(kernels::max_error),
            MeanAbsoluteError => Formula::Column(kernels::mae),
            MeanSquaredError => Formula::Column(kernels::mse),
            RootMeanSquaredError => Formula::Column(kernels::rmse),
            MeanSquaredLogError => Formula::Column(kernels::msle),
            MedianAbsoluteError => Formula::Column(kernels::median_absolute_error),
            MeanRelativeError => Formula::Column(kernels::mre),
            MeanAbsolutePercentageError => Formula::Column(kernels::mape),
            SymmetricMeanAbsolutePercentageError => Formula::Column(kernels::smape),
            MeanArctangentAbsolutePercentageError => Formula::Column(kernels::maape),
            MeanAbsoluteScaledError => Formula::Column(kernels::mase),
            NashSutcliffeEfficiency | CoefficientOfDetermination => Formula::Column(kernels::nse),
            WillmottIndex => Formula::Column(kernels::willmott_index),
            PearsonCorrelationCoefficient => Formula::Column(kernels::pearson_r),
            PearsonCorrelationCoefficientSquare => Formula::Column(kernels::pearson_r_squared),
            ConfidenceIndex => Formula::Column(kernels::confidence_index),
            DeviationOfRunoffVolume => Formula::Column(kernels::deviation_of_runoff_volume),
            KlingGuptaEfficiency => Formula::Column(kernels::kling_gupta),
            GiniCoefficient => Formula::Column(kernels::gini),
            GiniCoefficientWiki => Formula::Column(kernels::gini_wiki),
            PredictionOfChangeInDirection => Formula::Column(kernels::change_in_direction),
            Entropy => Formula::Column(kernels::entropy),
            CrossEntropy => Formula::Column(kernels::binned_cross_entropy),
            KullbackLeiblerDivergence => Formula::Column(kernels::binned_kl_divergence),
            JensenShannonDivergence => Formula::Column(kernels::binned_js_divergence),
            VarianceAccountedFor => Formula::Column(kernels::variance_accounted_for),
            RelativeAbsoluteError => Formula::Column(kernels::relative_absolute_error),
            A10Index => Formula::Column(kernels::a10),
            A20Index => Formula::Column(kernels::a20),
            NormalizedRootMeanSquareError => Formula::Column(kernels::nrmse),
            ResidualStandardError => Formula::Column(kernels::residual_standard_error),
            SingleRelativeError => Formula::Element(kernels::single_relative_error),
            SingleAbsoluteError => Formula::Element(kernels::single_absolute_error),
            SingleSquaredError => Formula::Element(kernels::single_squared_error),
            SingleSquaredLogError => Formula::Element(kernels::single_squared_log_error),
        }
    }

    /// Resolves a code (`RMSE`), its lowercase alias (`rmse`) or a long name.
    pub fn from_name(name: &str) -> Result<Self, MetricError> {
        registry()
            .get(name)
            .copied()
            .ok_or_else(|| MetricError::UnknownMetric(format!("RegressionMetric doesn't support metric named: {}", name)))
    }
}

fn registry() -> &'static HashMap<String, RegressionKind> {
    static REGISTRY: OnceLock<HashMap<String, RegressionKind>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut table = HashMap::new();
        for kind in RegressionKind::ALL {
            table.insert(kind.code().to_string(), kind);
            table.insert(kind.name().to_string(), kind);
        }
        for kind in RegressionKind::ALL {
            table.entry(kind.code().to_lowercase()).or_insert(kind);
        }
        table
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_code_alias_and_name() {
        assert_eq!(RegressionKind::from_name("RMSE").unwrap(), RootMeanSquaredError);
        assert_eq!(RegressionKind::from_name("rmse").unwrap(), RootMeanSquaredError);
        assert_eq!(RegressionKind::from_name("root_mean_squared_error").unwrap(), RootMeanSquaredError);
        assert_eq!(RegressionKind::from_name("R2s").unwrap(), PearsonCorrelationCoefficientSquare);
        assert_eq!(RegressionKind::from_name("r2s").unwrap(), PearsonCorrelationCoefficientSquare);
        assert_eq!(RegressionKind::from_name("R2").unwrap(), CoefficientOfDetermination);
        assert_eq!(RegressionKind::from_name("medae").unwrap(), MedianAbsoluteError);
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(RegressionKind::from_name("Rmse"), Err(MetricError::UnknownMetric(_))));
        assert!(matches!(RegressionKind::from_name("silhouette"), Err(MetricError::UnknownMetric(_))));
    }

    #[test]
    fn test_codes_and_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for kind in RegressionKind::ALL {
            assert!(seen.insert(kind.code().to_lowercase()), "duplicate code {}", kind.code());
            assert!(seen.insert(kind.name().to_string()), "duplicate name {}", kind.name());
        }
    }

    #[test]
    fn test_filter_defaults() {
        assert_eq!(MeanSquaredLogError.default_filters(), (true, true));
        assert_eq!(MeanAbsolutePercentageError.default_filters(), (true, false));
        assert_eq!(MeanAbsoluteError.default_filters(), (false, false));
    }
}
