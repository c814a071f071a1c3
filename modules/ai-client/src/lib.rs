pub mod openai;
pub mod perplexity;
pub mod traits;
pub mod util;

pub use openai::OpenAi;
pub use perplexity::Perplexity;
pub use traits::{Message, MessageRole, TextAnalyzer};
