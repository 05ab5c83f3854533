//! Pipeline configuration and injected vocabularies.
//!
//! Every tunable the pipeline consults lives here: thresholds, the header
//! keyword sets, the rating-column priority rules, sector vocabularies and
//! the stop-word list. Defaults target the Spanish survey exports this tool
//! was built for; numeric knobs can be overridden through the environment.

use std::collections::HashSet;

/// Formula used for the monthly satisfaction index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SatisfactionFormula {
    /// CSAT: `(very_positive + positive) / total * 100`.
    #[default]
    Csat,
    /// Net balance: `(very_positive - (very_negative + negative)) / total * 100`.
    NetBalance,
}

/// One rule for resolving the rating column from a normalized header cell.
///
/// Rules are evaluated per cell; the highest priority across all matching
/// rules wins, and across cells the first column reaching the best priority
/// is kept.
#[derive(Debug, Clone)]
pub struct RatingRule {
    pub priority: u8,
    pub terms: Vec<String>,
    pub exact: bool,
    pub exclude: Vec<String>,
}

impl RatingRule {
    pub fn matches(&self, header: &str) -> bool {
        if self.exclude.iter().any(|x| header.contains(x)) {
            return false;
        }
        if self.exact {
            self.terms.iter().any(|t| header == t.as_str())
        } else {
            self.terms.iter().any(|t| header.contains(t.as_str()))
        }
    }
}

/// Keyword sets matched (as substrings of the normalized cell text) against
/// candidate header rows.
#[derive(Debug, Clone)]
pub struct HeaderKeywords {
    pub date: Vec<String>,
    pub time: Vec<String>,
    pub sector: Vec<String>,
    pub location: Vec<String>,
    pub comment: Vec<String>,
    pub rating_rules: Vec<RatingRule>,
}

/// Contextual vocabulary for one sector category.
#[derive(Debug, Clone)]
pub struct SectorVocab {
    /// Category name, used only for logging.
    pub name: &'static str,
    /// Substrings of the normalized sector name that select this category.
    pub markers: Vec<String>,
    /// Terms a relevant comment is expected to contain.
    pub context: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum comment length (normalized chars) to retain a comment.
    pub min_comment_len: usize,
    /// Minimum token length kept by keyword extraction.
    pub min_token_len: usize,
    /// Keyword table size per sentiment.
    pub max_keywords: usize,
    /// Representative comments kept per sentiment.
    pub max_comments: usize,
    /// Rows inspected when locating the header row.
    pub header_scan_rows: usize,
    /// Upload size limit in bytes.
    pub max_upload_bytes: usize,
    pub formula: SatisfactionFormula,
    pub headers: HeaderKeywords,
    pub categories: Vec<SectorVocab>,
    /// Off-topic terms that disqualify a comment in non-general sectors.
    pub noise_terms: Vec<String>,
    pub stop_words: HashSet<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            min_comment_len: 12,
            min_token_len: 4,
            max_keywords: 40,
            max_comments: 5,
            header_scan_rows: 5,
            max_upload_bytes: 16 * 1024 * 1024,
            formula: SatisfactionFormula::default(),
            headers: HeaderKeywords {
                date: strings(&["fecha"]),
                time: strings(&["hora"]),
                sector: strings(&["sector"]),
                location: strings(&["ubicacion", "lugar"]),
                comment: strings(&["comentario", "observacion"]),
                rating_rules: vec![
                    RatingRule {
                        priority: 3,
                        terms: strings(&["calificacion", "rating"]),
                        exact: true,
                        exclude: vec![],
                    },
                    RatingRule {
                        priority: 2,
                        terms: strings(&["calificacion", "valoracion"]),
                        exact: false,
                        exclude: strings(&["desc"]),
                    },
                    RatingRule {
                        priority: 1,
                        terms: strings(&["nota"]),
                        exact: false,
                        exclude: vec![],
                    },
                    RatingRule {
                        priority: 1,
                        terms: strings(&["puntos"]),
                        exact: false,
                        exclude: strings(&["criticos"]),
                    },
                    // Last resort: a "calificacion_descripcion"-style column
                    // still beats failing detection outright.
                    RatingRule {
                        priority: 1,
                        terms: strings(&["calificacion"]),
                        exact: false,
                        exclude: vec![],
                    },
                ],
            },
            categories: vec![
                SectorVocab {
                    name: "reception",
                    markers: strings(&["atencion", "recepcion", "informes"]),
                    context: strings(&[
                        "atencion", "personal", "trato", "recepcion", "informacion",
                        "servicio", "amable", "amabilidad", "espera", "consulta",
                    ]),
                },
                SectorVocab {
                    name: "food",
                    markers: strings(&[
                        "gastronomia", "restaurante", "cafeteria", "buffet", "comida",
                    ]),
                    context: strings(&[
                        "comida", "plato", "menu", "mesa", "mozo", "bebida", "cafe",
                        "pedido", "sabor", "precio", "demora", "servicio",
                    ]),
                },
                SectorVocab {
                    name: "cashier",
                    markers: strings(&["caja", "pago", "cobro"]),
                    context: strings(&[
                        "caja", "cajero", "fila", "cola", "pago", "cobro", "espera",
                        "ticket", "cambio", "atencion", "demora", "rapida", "rapido",
                    ]),
                },
                SectorVocab {
                    name: "transport",
                    markers: strings(&["traslado", "transporte", "combi", "shuttle"]),
                    context: strings(&[
                        "combi", "chofer", "viaje", "traslado", "horario", "espera",
                        "asiento", "transporte", "demora", "parada",
                    ]),
                },
                SectorVocab {
                    name: "restrooms",
                    markers: strings(&["bano", "sanitario", "toilette"]),
                    context: strings(&[
                        "bano", "banos", "limpieza", "limpio", "sucio", "papel",
                        "jabon", "olor", "inodoro", "sanitario",
                    ]),
                },
            ],
            noise_terms: strings(&[
                "maquina", "maquinas", "slot", "slots", "ruleta", "poker",
                "tragamonedas", "ficha", "fichas", "jackpot", "apuesta", "apuestas",
                "bingo",
            ]),
            stop_words: strings(&[
                "para", "pero", "este", "esta", "esto", "estas", "estos", "como",
                "cuando", "donde", "porque", "entre", "sobre", "hasta", "desde",
                "tambien", "ademas", "estaba", "estaban", "fueron", "tiene",
                "tienen", "hacer", "hacen", "habia", "todos", "todas", "otro",
                "otra", "otros", "otras", "cada", "poco", "mucho", "mucha",
                "muchos", "muchas", "siempre", "nunca", "algo", "alguien",
                "nosotros", "ustedes", "usted", "quien", "cual", "cuales", "solo",
                "menos", "tanto", "tanta", "aunque", "ahora", "luego", "igual",
            ])
            .into_iter()
            .collect(),
        }
    }
}

impl PipelineConfig {
    /// Builds the default configuration with numeric knobs overridden from
    /// the environment when present.
    pub fn from_env() -> Self {
        let mut cfg = PipelineConfig::default();

        if let Some(v) = env_usize("MIN_COMMENT_LENGTH") {
            cfg.min_comment_len = v;
        }
        if let Some(v) = env_usize("MAX_KEYWORDS") {
            cfg.max_keywords = v;
        }
        if let Some(v) = env_usize("MAX_COMMENTS") {
            cfg.max_comments = v;
        }
        if let Some(v) = env_usize("MAX_UPLOAD_BYTES") {
            cfg.max_upload_bytes = v;
        }
        if let Ok(v) = std::env::var("SATISFACTION_FORMULA") {
            cfg.formula = match v.to_lowercase().as_str() {
                "net" | "net_balance" => SatisfactionFormula::NetBalance,
                _ => SatisfactionFormula::Csat,
            };
        }

        cfg
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
