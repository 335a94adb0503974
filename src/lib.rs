mod layout;
mod leave_one_out;
mod metadata;
mod negative;
mod preprocess;
mod price;
mod remap;
mod review;
mod splitter;
mod structs;
mod train;
mod upload;
mod utils;
pub use layout::CategoryLayout;
pub use leave_one_out::{DEFAULT_SHUFFLE_SEED, TrainTestSplit, split_train_test};
pub use metadata::{CategoryReport, IdRegistry, MetadataProcessor};
pub use negative::{DEFAULT_NUM_NEGATIVES, generate_negative_samples};
pub use preprocess::{Preprocessor, write_negatives, write_ratings};
pub use price::{PriceFormats, PriceOutcome, PriceStats, PriceSummary, parse_price};
pub use remap::IdMaps;
pub use review::{ReviewReport, filter_reviews, process_reviews};
pub use splitter::{SplitReport, split_file};
pub use structs::{Interaction, PreprocessReport, RawInteraction, TestNegative};
pub use train::TrainSplit;
pub use upload::{DEFAULT_ENDPOINT, DatasetStore, HubClient, upload_folder};
pub use utils::{is_truthy, open_jsonl};
