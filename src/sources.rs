//! Source adapters that load heterogeneous inputs into [`Document`]s.
//!
//! Each source kind gets one adapter behind the [`SourceAdapter`]
//! capability interface. Adapters are registered in a fixed ordered list
//! and processed by the [`DocumentStore`](crate::store::DocumentStore),
//! which isolates a failure in one adapter from the rest.
//!
//! Source kinds:
//! - tabular records (fab capacity, energy prices, material properties),
//!   one row per document with the row fields carried in metadata
//! - hand-authored policy facts, injected verbatim with confidence 1.0
//! - long-form report text, chunked with overlap and capped per source

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::chunking::chunk_text;
use crate::config::KnowledgeConfig;
use crate::document::Document;
use crate::error::{KnowledgeError, Result};

/// A loadable knowledge source.
///
/// `load` is idempotent: calling it twice produces the same documents.
/// Errors are reported per adapter and never abort ingestion of the
/// remaining sources.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short name used in logs and ingestion errors.
    fn name(&self) -> &str;

    /// Load this source into documents.
    async fn load(&self) -> Result<Vec<Document>>;
}

fn ingestion_error(source: &str, message: impl Into<String>) -> KnowledgeError {
    KnowledgeError::Ingestion { source_name: source.to_string(), message: message.into() }
}

async fn read_json_records<T>(name: &str, path: &Path) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ingestion_error(name, format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| ingestion_error(name, format!("cannot parse {}: {e}", path.display())))
}

fn default_year() -> i64 {
    2024
}

fn default_quality() -> String {
    "unknown".to_string()
}

// ── Fab capacity (tabular) ─────────────────────────────────────────

/// One row of fab capacity, energy use, and cost data.
///
/// Missing optional fields degrade to documented defaults: `year` to
/// 2024, `data_quality` to `"unknown"`, and an absent technology node is
/// omitted from the synthesized sentence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FabCapacityRecord {
    pub material: String,
    #[serde(default)]
    pub technology_node_nm: Option<f64>,
    #[serde(default)]
    pub global_capacity_wafers_per_year: f64,
    #[serde(default)]
    pub eu_capacity_wafers_per_year: f64,
    #[serde(default)]
    pub eu_share_pct: f64,
    #[serde(default)]
    pub energy_kwh_per_wafer: f64,
    #[serde(default)]
    pub co2_kg_per_wafer: f64,
    #[serde(default)]
    pub avg_cost_per_wafer_eur: f64,
    #[serde(default = "default_year")]
    pub year: i64,
    #[serde(default = "default_quality")]
    pub data_quality: String,
    #[serde(default)]
    pub source: Option<String>,
}

enum TabularInput<T> {
    File(PathBuf),
    Records(Vec<T>),
}

/// Loads fab capacity rows and converts each row 1:1 into a document
/// whose content is a synthesized sentence and whose metadata carries the
/// row fields verbatim.
pub struct FabCapacitySource {
    input: TabularInput<FabCapacityRecord>,
}

impl FabCapacitySource {
    /// Read records from a JSON file (an array of objects).
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self { input: TabularInput::File(path.into()) }
    }

    /// Use already-parsed records.
    pub fn from_records(records: Vec<FabCapacityRecord>) -> Self {
        Self { input: TabularInput::Records(records) }
    }

    fn to_document(record: &FabCapacityRecord) -> Document {
        let mut parts = vec![format!("{} semiconductor", record.material)];
        if let Some(node) = record.technology_node_nm {
            parts.push(format!("(technology node: {node} nm)"));
        }
        parts.push(format!(
            "has global production capacity of {:.0} wafers/year",
            record.global_capacity_wafers_per_year
        ));
        if record.eu_share_pct > 0.0 {
            parts.push(format!(
                "with EU capacity of {:.0} wafers ({:.1}% share).",
                record.eu_capacity_wafers_per_year, record.eu_share_pct
            ));
        } else {
            parts.push(format!(
                "with EU capacity of {:.0} wafers.",
                record.eu_capacity_wafers_per_year
            ));
        }
        parts.push(format!("Energy consumption: {:.0} kWh/wafer,", record.energy_kwh_per_wafer));
        parts.push(format!("CO2 footprint: {:.0} kg/wafer,", record.co2_kg_per_wafer));
        parts.push(format!("average cost: €{:.0}/wafer.", record.avg_cost_per_wafer_eur));

        let source = record
            .source
            .clone()
            .unwrap_or_else(|| "EU JRC Semiconductor Database".to_string());

        let mut doc = Document::new(source, parts.join(" "), 0.95)
            .with_url("https://publications.jrc.ec.europa.eu/")
            .with_meta("material", json!(record.material))
            .with_meta("eu_share_pct", json!(record.eu_share_pct))
            .with_meta("type", json!("production_data"))
            .with_meta("year", json!(record.year))
            .with_meta("data_quality", json!(record.data_quality));
        if let Some(node) = record.technology_node_nm {
            doc = doc.with_meta("technology_node_nm", json!(node));
        }
        doc
    }
}

#[async_trait]
impl SourceAdapter for FabCapacitySource {
    fn name(&self) -> &str {
        "fab_capacity"
    }

    async fn load(&self) -> Result<Vec<Document>> {
        let records = match &self.input {
            TabularInput::File(path) => read_json_records(self.name(), path).await?,
            TabularInput::Records(records) => records.clone(),
        };
        debug!(source = self.name(), rows = records.len(), "loaded tabular records");
        Ok(records.iter().map(Self::to_document).collect())
    }
}

// ── Energy prices (tabular) ────────────────────────────────────────

/// One row of regional industrial electricity price data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyPriceRecord {
    pub region: String,
    #[serde(default)]
    pub electricity_eur_per_kwh: f64,
    #[serde(default)]
    pub trend_annual_pct: f64,
    #[serde(default)]
    pub carbon_intensity_g_per_kwh: f64,
    #[serde(default = "default_year")]
    pub year: i64,
    #[serde(default = "default_quality")]
    pub data_quality: String,
}

/// Loads regional energy price rows, one document per region-year row.
pub struct EnergyPriceSource {
    input: TabularInput<EnergyPriceRecord>,
}

impl EnergyPriceSource {
    /// Read records from a JSON file (an array of objects).
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self { input: TabularInput::File(path.into()) }
    }

    /// Use already-parsed records.
    pub fn from_records(records: Vec<EnergyPriceRecord>) -> Self {
        Self { input: TabularInput::Records(records) }
    }

    fn to_document(record: &EnergyPriceRecord) -> Document {
        let content = format!(
            "{} has industrial electricity prices of €{:.3}/kWh ({}) with annual trend of \
             {:.1}%. Carbon intensity: {:.0} g CO2/kWh. Data quality: {}.",
            record.region,
            record.electricity_eur_per_kwh,
            record.year,
            record.trend_annual_pct,
            record.carbon_intensity_g_per_kwh,
            record.data_quality,
        );
        Document::new("OECD Energy Prices Database", content, 0.90)
            .with_url("https://www.oecd.org/en/data/indicators/electricity-prices.html")
            .with_meta("region", json!(record.region))
            .with_meta("year", json!(record.year))
            .with_meta("type", json!("energy_price"))
            .with_meta("data_quality", json!(record.data_quality))
    }
}

#[async_trait]
impl SourceAdapter for EnergyPriceSource {
    fn name(&self) -> &str {
        "energy_prices"
    }

    async fn load(&self) -> Result<Vec<Document>> {
        let records = match &self.input {
            TabularInput::File(path) => read_json_records(self.name(), path).await?,
            TabularInput::Records(records) => records.clone(),
        };
        debug!(source = self.name(), rows = records.len(), "loaded tabular records");
        Ok(records.iter().map(Self::to_document).collect())
    }
}

// ── Material properties (tabular, built-in default table) ──────────

/// One row of semiconductor material properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialPropertyRecord {
    pub material: String,
    pub bandgap_ev: f64,
    pub electron_mobility_cm2_vs: f64,
    pub thermal_conductivity_w_mk: f64,
    pub max_temperature_c: f64,
    pub cost_relative_to_si: f64,
}

/// Loads material property rows. When no file is supplied, a built-in
/// reference table covering the common power/RF materials is used.
pub struct MaterialPropertiesSource {
    input: TabularInput<MaterialPropertyRecord>,
}

impl MaterialPropertiesSource {
    /// Read records from a JSON file (an array of objects).
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self { input: TabularInput::File(path.into()) }
    }

    /// Use the built-in reference table.
    pub fn builtin() -> Self {
        let rows = [
            ("Si", 1.12, 1400.0, 150.0, 125.0, 1.0),
            ("SiC", 3.26, 900.0, 490.0, 600.0, 1.6),
            ("GaN", 3.40, 2000.0, 130.0, 500.0, 2.4),
            ("GaAs", 1.42, 8500.0, 55.0, 300.0, 3.0),
            ("IGZO", 3.05, 10.0, 10.0, 200.0, 1.4),
            ("CNT", 0.5, 100000.0, 3000.0, 400.0, 6.0),
            ("MoS₂", 1.8, 200.0, 34.0, 300.0, 5.0),
        ];
        let records = rows
            .into_iter()
            .map(|(material, bandgap, mobility, conductivity, max_temp, cost)| {
                MaterialPropertyRecord {
                    material: material.to_string(),
                    bandgap_ev: bandgap,
                    electron_mobility_cm2_vs: mobility,
                    thermal_conductivity_w_mk: conductivity,
                    max_temperature_c: max_temp,
                    cost_relative_to_si: cost,
                }
            })
            .collect();
        Self { input: TabularInput::Records(records) }
    }

    fn to_document(record: &MaterialPropertyRecord) -> Document {
        let content = format!(
            "{} properties: bandgap {} eV, electron mobility {} cm²/Vs, thermal conductivity \
             {} W/mK, max temperature {}°C. Cost is {}x relative to Silicon.",
            record.material,
            record.bandgap_ev,
            record.electron_mobility_cm2_vs,
            record.thermal_conductivity_w_mk,
            record.max_temperature_c,
            record.cost_relative_to_si,
        );
        Document::new("Materials Project / MatWeb Database", content, 0.85)
            .with_url("https://materialsproject.org")
            .with_meta("material", json!(record.material))
            .with_meta("type", json!("material_properties"))
            .with_meta("year", json!(2024))
    }
}

#[async_trait]
impl SourceAdapter for MaterialPropertiesSource {
    fn name(&self) -> &str {
        "material_properties"
    }

    async fn load(&self) -> Result<Vec<Document>> {
        let records = match &self.input {
            TabularInput::File(path) => read_json_records(self.name(), path).await?,
            TabularInput::Records(records) => records.clone(),
        };
        debug!(source = self.name(), rows = records.len(), "loaded tabular records");
        Ok(records.iter().map(Self::to_document).collect())
    }
}

// ── Policy facts (hand-authored) ───────────────────────────────────

/// Injects hand-authored policy knowledge as single documents with
/// confidence 1.0.
pub struct PolicyFactsSource {
    documents: Vec<Document>,
}

impl PolicyFactsSource {
    /// Use a custom set of hand-authored documents.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// The built-in policy fact set covering EU semiconductor funding
    /// and carbon pricing.
    pub fn builtin() -> Self {
        let documents = vec![
            Document::new(
                "EU Chips Act 2023",
                "The European Chips Act provides €43 billion in public and private investment \
                 to strengthen Europe's semiconductor ecosystem. It offers up to 40% subsidies \
                 for First-of-a-Kind fabrication facilities using advanced technologies like \
                 SiC, GaN, and sub-7nm CMOS.",
                1.0,
            )
            .with_url("https://ec.europa.eu/commission/presscorner/detail/en/ip_23_510")
            .with_meta("type", json!("policy"))
            .with_meta("program", json!("chips_act"))
            .with_meta("year", json!(2023)),
            Document::new(
                "EU Chips Act - Funding Priorities",
                "Priority sectors for Chips Act funding: automotive (especially EV power \
                 electronics), industrial automation, medical devices, aerospace and defense, \
                 and 5G/6G telecommunications. Wide-bandgap semiconductors (SiC, GaN) receive \
                 higher priority due to energy efficiency and strategic importance.",
                1.0,
            )
            .with_url("https://ec.europa.eu/chips-act")
            .with_meta("type", json!("policy"))
            .with_meta("program", json!("chips_act"))
            .with_meta("year", json!(2023)),
            Document::new(
                "EU Carbon Tax (CBAM) 2024",
                "The EU Carbon Border Adjustment Mechanism (CBAM) sets carbon tax at €80-100 \
                 per ton CO2 as of 2024, increasing to €130-150 by 2030. This significantly \
                 impacts semiconductor manufacturing TCO, favoring low-carbon technologies \
                 like SiC and GaN over traditional Silicon in high-power applications.",
                1.0,
            )
            .with_url("https://taxation-customs.ec.europa.eu/carbon-border-adjustment-mechanism")
            .with_meta("type", json!("policy"))
            .with_meta("program", json!("cbam"))
            .with_meta("year", json!(2024)),
            Document::new(
                "STMicroelectronics SiC Expansion 2024",
                "STMicroelectronics received €2.9B EU Chips Act funding for SiC fab expansion \
                 in Catania, Italy. Expected to triple SiC wafer capacity by 2026, reducing \
                 costs by 30% and enabling €1B+ annual revenue from automotive power modules.",
                1.0,
            )
            .with_url("https://www.st.com/content/st_com/en/about/media-center/press-item.html")
            .with_meta("type", json!("case_study"))
            .with_meta("company", json!("STMicro"))
            .with_meta("year", json!(2024)),
        ];
        Self { documents }
    }
}

#[async_trait]
impl SourceAdapter for PolicyFactsSource {
    fn name(&self) -> &str {
        "policy_facts"
    }

    async fn load(&self) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

// ── Long-form report text ──────────────────────────────────────────

/// Loads a long-form UTF-8 text file (an extracted report or policy
/// document), splits it into overlapping chunks, and caps the chunk
/// count per source to bound ingestion cost.
pub struct ReportTextSource {
    path: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
    max_chunks: usize,
}

/// A report with less text than this is treated as unreadable (a scanned
/// or image-only extraction).
const MIN_REPORT_CHARS: usize = 100;

impl ReportTextSource {
    /// Create a source for `path` using the chunking parameters from
    /// `config`.
    pub fn new(path: impl Into<PathBuf>, config: &KnowledgeConfig) -> Self {
        Self {
            path: path.into(),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            max_chunks: config.max_chunks_per_source,
        }
    }

    fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string())
    }
}

#[async_trait]
impl SourceAdapter for ReportTextSource {
    fn name(&self) -> &str {
        "report_text"
    }

    async fn load(&self) -> Result<Vec<Document>> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ingestion_error(self.name(), format!("cannot read {}: {e}", self.path.display()))
        })?;

        if text.trim().len() < MIN_REPORT_CHARS {
            return Err(ingestion_error(
                self.name(),
                format!("{}: no usable text extracted", self.path.display()),
            ));
        }

        let mut chunks = chunk_text(&text, self.chunk_size, self.chunk_overlap);
        chunks.truncate(self.max_chunks);
        let total = chunks.len();
        let stem = self.stem();
        let url = format!("file://{}", self.path.display());

        debug!(source = self.name(), file = %self.path.display(), chunks = total, "chunked report");

        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                Document::new(format!("{stem} (Part {}/{total})", i + 1), chunk, 0.95)
                    .with_url(url.clone())
                    .with_meta("type", json!("report"))
                    .with_meta("file", json!(self.path.display().to_string()))
                    .with_meta("chunk", json!(i + 1))
                    .with_meta("total_chunks", json!(total))
            })
            .collect())
    }
}
