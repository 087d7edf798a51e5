use std::{collections::HashMap, sync::OnceLock};

use serde::Serialize;

use crate::error::MetricError;

use super::{
    external::{self, ExternalKernel},
    internal::{self, InternalKernel},
};

/// Whether smaller or larger values of a metric are better.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Min,
    Max,
}

/// Static description of a clustering metric's range and optimum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MetricDescriptor {
    #[serde(rename = "type")]
    pub direction: Direction,
    pub range: &'static str,
    pub best: &'static str,
}

const fn describe(direction: Direction, range: &'static str, best: &'static str) -> MetricDescriptor {
    MetricDescriptor { direction, range, best }
}

/// Every clustering metric the evaluator can compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClusteringKind {
    BallHallIndex,
    CalinskiHarabaszIndex,
    XieBeniIndex,
    BanfeldRafteryIndex,
    DaviesBouldinIndex,
    DetRatioIndex,
    LogDetRatioIndex,
    DunnIndex,
    KsqDetwIndex,
    LogSsRatioIndex,
    SilhouetteIndex,
    SumSquaredErrorIndex,
    DudaHartIndex,
    BealeIndex,
    RSquaredIndex,
    DensityBasedClusteringValidationIndex,
    HartiganIndex,
    BakerHubertGammaIndex,
    GPlusIndex,
    MutualInfoScore,
    NormalizedMutualInfoScore,
    RandScore,
    FowlkesMallowsScore,
    HomogeneityScore,
    CompletenessScore,
    VMeasureScore,
    PrecisionScore,
    RecallScore,
    FMeasureScore,
    CzekanowskiDiceScore,
    HubertGammaScore,
    JaccardScore,
    KulczynskiScore,
    McNemarScore,
    PhiScore,
    RogersTanimotoScore,
    RusselRaoScore,
    SokalSneath1Score,
    SokalSneath2Score,
    PurityScore,
    EntropyScore,
    TauScore,
}

#[derive(Clone, Copy)]
pub(crate) enum Formula {
    /// Needs features and predicted labels.
    Internal(InternalKernel),
    /// Needs true and predicted labels.
    External(ExternalKernel),
}

use ClusteringKind::*;
use Direction::{Max, Min};

impl ClusteringKind {
    pub const ALL: [ClusteringKind; 42] = [
        BallHallIndex,
        CalinskiHarabaszIndex,
        XieBeniIndex,
        BanfeldRafteryIndex,
        DaviesBouldinIndex,
        DetRatioIndex,
        LogDetRatioIndex,
        DunnIndex,
        KsqDetwIndex,
        LogSsRatioIndex,
        SilhouetteIndex,
        SumSquaredErrorIndex,
        DudaHartIndex,
        BealeIndex,
        RSquaredIndex,
        DensityBasedClusteringValidationIndex,
        HartiganIndex,
        BakerHubertGammaIndex,
        GPlusIndex,
        MutualInfoScore,
        NormalizedMutualInfoScore,
        RandScore,
        FowlkesMallowsScore,
        HomogeneityScore,
        CompletenessScore,
        VMeasureScore,
        PrecisionScore,
        RecallScore,
        FMeasureScore,
        CzekanowskiDiceScore,
        HubertGammaScore,
        JaccardScore,
        KulczynskiScore,
        McNemarScore,
        PhiScore,
        RogersTanimotoScore,
        RusselRaoScore,
        SokalSneath1Score,
        SokalSneath2Score,
        PurityScore,
        EntropyScore,
        TauScore,
    ];

    pub fn code(self) -> &'static str {
        match self {
            BallHallIndex => "BHI",
            CalinskiHarabaszIndex => "CHI",
            XieBeniIndex => "XBI",
            BanfeldRafteryIndex => "BRI",
            DaviesBouldinIndex => "DBI",
            DetRatioIndex => "DRI",
            LogDetRatioIndex => "LDRI",
            DunnIndex => "DI",
            KsqDetwIndex => "KDI",
            LogSsRatioIndex => "LSRI",
            SilhouetteIndex => "SI",
            SumSquaredErrorIndex => "SSEI",
            DudaHartIndex => "DHI",
            BealeIndex => "BI",
            RSquaredIndex => "RSI",
            DensityBasedClusteringValidationIndex => "DBCVI",
            HartiganIndex => "HI",
            BakerHubertGammaIndex => "BHGI",
            GPlusIndex => "GPI",
            MutualInfoScore => "MIS",
            NormalizedMutualInfoScore => "NMIS",
            RandScore => "RaS",
            FowlkesMallowsScore => "FMS",
            HomogeneityScore => "HS",
            CompletenessScore => "CS",
            VMeasureScore => "VMS",
            PrecisionScore => "PrS",
            RecallScore => "ReS",
            FMeasureScore => "FmS",
            CzekanowskiDiceScore => "CDS",
            HubertGammaScore => "HGS",
            JaccardScore => "JS",
            KulczynskiScore => "KS",
            McNemarScore => "MNS",
            PhiScore => "PhS",
            RogersTanimotoScore => "RTS",
            RusselRaoScore => "RRS",
            SokalSneath1Score => "SS1S",
            SokalSneath2Score => "SS2S",
            PurityScore => "PuS",
            EntropyScore => "ES",
            TauScore => "TS",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BallHallIndex => "ball_hall_index",
            CalinskiHarabaszIndex => "calinski_harabasz_index",
            XieBeniIndex => "xie_beni_index",
            BanfeldRafteryIndex => "banfeld_raftery_index",
            DaviesBouldinIndex => "davies_bouldin_index",
            DetRatioIndex => "det_ratio_index",
            LogDetRatioIndex => "log_det_ratio_index",
            DunnIndex => "dunn_index",
            KsqDetwIndex => "ksq_detw_index",
            LogSsRatioIndex => "log_ss_ratio_index",
            SilhouetteIndex => "silhouette_index",
            SumSquaredErrorIndex => "sum_squared_error_index",
            DudaHartIndex => "duda_hart_index",
            BealeIndex => "beale_index",
            RSquaredIndex => "r_squared_index",
            DensityBasedClusteringValidationIndex => "density_based_clustering_validation_index",
            HartiganIndex => "hartigan_index",
            BakerHubertGammaIndex => "baker_hubert_gamma_index",
            GPlusIndex => "g_plus_index",
            MutualInfoScore => "mutual_info_score",
            NormalizedMutualInfoScore => "normalized_mutual_info_score",
            RandScore => "rand_score",
            FowlkesMallowsScore => "fowlkes_mallows_score",
            HomogeneityScore => "homogeneity_score",
            CompletenessScore => "completeness_score",
            VMeasureScore => "v_measure_score",
            PrecisionScore => "precision_score",
            RecallScore => "recall_score",
            FMeasureScore => "f_measure_score",
            CzekanowskiDiceScore => "czekanowski_dice_score",
            HubertGammaScore => "hubert_gamma_score",
            JaccardScore => "jaccard_score",
            KulczynskiScore => "kulczynski_score",
            McNemarScore => "mc_nemar_score",
            PhiScore => "phi_score",
            RogersTanimotoScore => "rogers_tanimoto_score",
            RusselRaoScore => "russel_rao_score",
            SokalSneath1Score => "sokal_sneath1_score",
            SokalSneath2Score => "sokal_sneath2_score",
            PurityScore => "purity_score",
            EntropyScore => "entropy_score",
            TauScore => "tau_score",
        }
    }

    pub fn descriptor(self) -> MetricDescriptor {
        const POSITIVE: &str = "[0, +inf)";
        const REAL: &str = "(-inf, +inf)";
        const UNIT: &str = "[0, 1]";
        match self {
            BallHallIndex | XieBeniIndex | DaviesBouldinIndex | SumSquaredErrorIndex | DudaHartIndex | BealeIndex
            | HartiganIndex => describe(Min, POSITIVE, "0"),
            BanfeldRafteryIndex | KsqDetwIndex => describe(Min, REAL, "no best"),
            DetRatioIndex | DunnIndex | CalinskiHarabaszIndex | MutualInfoScore => {
                describe(Max, POSITIVE, "no best")
            }
            LogDetRatioIndex | LogSsRatioIndex | McNemarScore | PhiScore => describe(Max, REAL, "no best"),
            SilhouetteIndex | TauScore => describe(Max, "[-1, +1]", "1"),
            RSquaredIndex => describe(Max, "(-inf, +1]", "1"),
            DensityBasedClusteringValidationIndex | EntropyScore => describe(Min, UNIT, "0"),
            BakerHubertGammaIndex | HubertGammaScore => describe(Max, "[-1, 1]", "1"),
            GPlusIndex => describe(Min, UNIT, "0"),
            NormalizedMutualInfoScore | RandScore | FowlkesMallowsScore | HomogeneityScore | CompletenessScore
            | VMeasureScore | PrecisionScore | RecallScore | FMeasureScore | CzekanowskiDiceScore | JaccardScore
            | KulczynskiScore | RogersTanimotoScore | RusselRaoScore | SokalSneath1Score | SokalSneath2Score
            | PurityScore => describe(Max, UNIT, "1"),
        }
    }

    pub fn is_internal(self) -> bool {
        matches!(self.formula(), Formula::Internal(_))
    }

    pub(crate) fn formula(self) -> Formula {
        match self {
            BallHallIndex => Formula::Internal(internal::ball_hall),
            CalinskiHarabaszIndex => Formula::Internal(internal::calinski_harabasz),
            XieBeniIndex => Formula::Internal(internal::xie_beni),
            BanfeldRafteryIndex => Formula::Internal(internal::banfeld_raftery),
            DaviesBouldinIndex => Formula::Internal(internal::davies_bouldin),
            DetRatioIndex => Formula::Internal(internal::det_ratio),
            LogDetRatioIndex => Formula::Internal(internal::log_det_ratio),
            DunnIndex => Formula::Internal(internal::dunn),
            KsqDetwIndex => Formula::Internal(internal::ksq_detw),
            LogSsRatioIndex => Formula::Internal(internal::log_ss_ratio),
            SilhouetteIndex => Formula::Internal(internal::silhouette),
            SumSquaredErrorIndex => Formula::Internal(internal::sum_squared_error),
            DudaHartIndex => Formula::Internal(internal::duda_hart),
            BealeIndex => Formula::Internal(internal::beale),
            RSquaredIndex => Formula::Internal(internal::r_squared),
            DensityBasedClusteringValidationIndex => Formula::Internal(internal::density_based_validation),
            HartiganIndex => Formula::Internal(internal::hartigan),
            BakerHubertGammaIndex => Formula::Internal(internal::baker_hubert_gamma),
            GPlusIndex => Formula::Internal(internal::g_plus),
            MutualInfoScore => Formula::External(external::mutual_info),
            NormalizedMutualInfoScore => Formula::External(external::normalized_mutual_info),
            RandScore => Formula::External(external::rand_score),
            FowlkesMallowsScore => Formula::External(external::fowlkes_mallows),
            HomogeneityScore => Formula::External(external::homogeneity_score),
            CompletenessScore => Formula::External(external::completeness_score),
            VMeasureScore => Formula::External(external::v_measure),
            PrecisionScore => Formula::External(external::precision),
            RecallScore => Formula::External(external::recall),
            FMeasureScore => Formula::External(external::f_measure),
            CzekanowskiDiceScore => Formula::External(external::czekanowski_dice),
            HubertGammaScore => Formula::External(external::hubert_gamma),
            JaccardScore => Formula::External(external::jaccard),
            KulczynskiScore => Formula::External(external::kulczynski),
            McNemarScore => Formula::External(external::mc_nemar),
            PhiScore => Formula::External(external::phi),
            RogersTanimotoScore => Formula::External(external::rogers_tanimoto),
            RusselRaoScore => Formula::External(external::russel_rao),
            SokalSneath1Score => Formula::External(external::sokal_sneath1),
            SokalSneath2Score => Formula::External(external::sokal_sneath2),
            PurityScore => Formula::External(external::purity),
            EntropyScore => Formula::External(external::entropy_score),
            TauScore => Formula::External(external::tau),
        }
    }

    /// Resolves a case-sensitive code (`FMS`, `FmS`) or a long name.
    pub fn from_name(name: &str) -> Result<Self, MetricError> {
        registry()
            .get(name)
            .copied()
            .ok_or_else(|| MetricError::UnknownMetric(format!("ClusteringMetric doesn't support metric named: {}", name)))
    }
}

fn registry() -> &'static HashMap<&'static str, ClusteringKind> {
    static REGISTRY: OnceLock<HashMap<&'static str, ClusteringKind>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        ClusteringKind::ALL
            .iter()
            .flat_map(|&kind| [(kind.code(), kind), (kind.name(), kind)])
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_sensitive_codes() {
        assert_eq!(ClusteringKind::from_name("FMS").unwrap(), FowlkesMallowsScore);
        assert_eq!(ClusteringKind::from_name("FmS").unwrap(), FMeasureScore);
        assert_eq!(ClusteringKind::from_name("silhouette_index").unwrap(), SilhouetteIndex);
        assert!(matches!(ClusteringKind::from_name("fms"), Err(MetricError::UnknownMetric(_))));
    }

    #[test]
    fn test_every_kind_is_registered() {
        for kind in ClusteringKind::ALL {
            assert_eq!(ClusteringKind::from_name(kind.code()).unwrap(), kind);
            assert_eq!(ClusteringKind::from_name(kind.name()).unwrap(), kind);
        }
        assert_eq!(ClusteringKind::ALL.iter().filter(|k| k.is_internal()).count(), 19);
    }

    #[test]
    fn test_descriptor_serializes() {
        let json = serde_json::to_string(&SilhouetteIndex.descriptor()).unwrap();
        assert_eq!(json, r#"{"type":"max","range":"[-1, +1]","best":"1"}"#);
    }
}
