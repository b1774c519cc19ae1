pub mod catalog;
pub mod config;
pub mod duplicates;
pub mod metrics;
pub mod naming;
pub mod notify;
pub mod parser;
pub mod placer;
pub mod processor;
pub mod quality;
pub mod review;
pub mod subtitle;
pub mod testing;
pub mod upgrade;

pub use catalog::{
    CatalogError, CatalogMatch, CatalogRecord, CatalogResolver, MetadataCatalog, Resolution,
    ResolvedFilm, TmdbClient,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use duplicates::{DestinationState, DuplicateCandidate, ExistingFilm, Relationship};
pub use notify::{LibraryNotifier, NoopNotifier, NotifyError, PlexNotifier};
pub use parser::{FilmDescriptor, FilmParser, IgnoreReason};
pub use placer::{FsPlacer, TransferResult, TransferStatus};
pub use processor::{FilmOrganizer, FilmOutcome, FilmStatus, OrganizeError, RunControl, RunReport};
pub use quality::{Media, Quality};
pub use review::{AutoReviewer, DuplicateChoice, MatchChoice, Reviewer};
pub use upgrade::{decide, verdict, Decision, Verdict};
