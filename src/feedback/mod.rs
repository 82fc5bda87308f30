pub mod chime;
pub mod siren;

use chime::ConfirmChime;
use siren::SirenTone;

use rodio::{OutputStream, Sink};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;

enum FeedbackCommand {
    Siren { seconds: f32 },
    Chime { freq: f32 },
    SetVolume(f32),
    Stop,
}

/// Audible cue engine for hosts without a speech-synthesis surface: the SOS
/// siren and the short confirmation/attention chimes. Commands are forwarded
/// to a dedicated thread holding the non-Send audio objects; every call is
/// fire-and-forget.
#[derive(Clone)]
pub struct FeedbackEngine {
    tx: Arc<Mutex<Option<Sender<FeedbackCommand>>>>,
}

impl FeedbackEngine {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<FeedbackCommand>, String> {
        if let Some(tx) = self.tx.lock().map_err(|e| e.to_string())?.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<FeedbackCommand>();

        thread::Builder::new()
            .name("feedback-engine".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<(), String> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                        let new_sink = Sink::try_new(&handle)
                            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        FeedbackCommand::Siren { seconds } => {
                            let _ = ensure_sink(&mut _stream, &mut sink);
                            if let Some(ref s) = sink {
                                s.append(SirenTone::new(seconds));
                            }
                        }
                        FeedbackCommand::Chime { freq } => {
                            let _ = ensure_sink(&mut _stream, &mut sink);
                            if let Some(ref s) = sink {
                                s.append(ConfirmChime::new(freq));
                            }
                        }
                        FeedbackCommand::SetVolume(v) => {
                            if let Some(ref s) = sink {
                                s.set_volume(v.clamp(0.0, 1.0));
                            }
                        }
                        FeedbackCommand::Stop => {
                            if let Some(s_old) = sink.take() {
                                s_old.stop();
                            }
                            _stream = None;
                        }
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        let tx_clone = tx.clone();
        *self.tx.lock().map_err(|e| e.to_string())? = Some(tx);
        Ok(tx_clone)
    }

    pub fn play_siren(&self, seconds: f32) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(FeedbackCommand::Siren { seconds })
            .map_err(|e| e.to_string())
    }

    pub fn play_chime(&self, freq: f32) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(FeedbackCommand::Chime { freq })
            .map_err(|e| e.to_string())
    }

    pub fn set_volume(&self, volume: f32) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(FeedbackCommand::SetVolume(volume))
            .map_err(|e| e.to_string())
    }

    pub fn stop(&self) -> Result<(), String> {
        if let Ok(Some(tx)) = self.tx.lock().map(|g| g.clone()) {
            let _ = tx.send(FeedbackCommand::Stop);
        }
        Ok(())
    }
}

impl Default for FeedbackEngine {
    fn default() -> Self {
        Self::new()
    }
}
