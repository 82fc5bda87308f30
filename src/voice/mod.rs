pub mod intent;
pub mod processor;
pub mod recognizer;
pub mod synthesis;

pub use processor::{
    CommandDispatch, CommandInfo, ConfirmationResponse, ProcessorConfig, VoiceCommandProcessor,
};
pub use recognizer::{
    EngineError, EngineEvent, RecognitionEngine, RecognitionError, RecognizerState,
    SpeechRecognitionAdapter, UnsupportedEngine,
};
pub use synthesis::{CueSynthesizer, NullSynthesizer, SpeechSynthesizer};
