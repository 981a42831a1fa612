//! Rodio-backed player running on a dedicated audio thread.
//!
//! The output stream never leaves the worker thread. Callers talk to it
//! through a request channel, which also serializes every playback command.

use crate::{AudioError, AudioPlayer};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rodio::{Decoder, OutputStreamBuilder, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

enum PlayerRequest {
    Load {
        path: PathBuf,
        reply: Sender<crate::Result<()>>,
    },
    Play {
        reply: Sender<crate::Result<()>>,
    },
    IsBusy {
        reply: Sender<bool>,
    },
    Stop {
        reply: Sender<()>,
    },
    Shutdown,
}

pub struct RodioPlayer {
    request_tx: Sender<PlayerRequest>,
    worker_handle: Option<JoinHandle<()>>,
}

impl RodioPlayer {
    /// Open the default output device. Fails if there is none.
    pub fn new() -> crate::Result<Self> {
        let (request_tx, request_rx) = unbounded::<PlayerRequest>();
        let (ready_tx, ready_rx) = bounded::<crate::Result<()>>(1);

        let worker_handle = thread::Builder::new()
            .name("audio-player".to_string())
            .spawn(move || playback_loop(ready_tx, request_rx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                request_tx,
                worker_handle: Some(worker_handle),
            }),
            Ok(Err(e)) => {
                let _ = worker_handle.join();
                Err(e)
            }
            Err(_) => Err(AudioError::WorkerGone),
        }
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> PlayerRequest) -> Option<T> {
        let (reply_tx, reply_rx) = bounded(1);
        self.request_tx.send(make(reply_tx)).ok()?;
        reply_rx.recv().ok()
    }
}

impl AudioPlayer for RodioPlayer {
    fn load(&self, path: &Path) -> crate::Result<()> {
        self.request(|reply| PlayerRequest::Load {
            path: path.to_path_buf(),
            reply,
        })
        .unwrap_or(Err(AudioError::WorkerGone))
    }

    fn play(&self) -> crate::Result<()> {
        self.request(|reply| PlayerRequest::Play { reply })
            .unwrap_or(Err(AudioError::WorkerGone))
    }

    fn is_busy(&self) -> bool {
        self.request(|reply| PlayerRequest::IsBusy { reply })
            .unwrap_or(false)
    }

    /// Returns once the worker has dropped the sink and any loaded clip, so
    /// the file is closed by the time this returns.
    fn stop(&self) {
        let _ = self.request(|reply| PlayerRequest::Stop { reply });
    }
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        let _ = self.request_tx.send(PlayerRequest::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}

fn playback_loop(ready_tx: Sender<crate::Result<()>>, request_rx: Receiver<PlayerRequest>) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(AudioError::OutputUnavailable(e.to_string())));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));
    tracing::debug!("Audio player started");

    let mut loaded: Option<Decoder<BufReader<File>>> = None;
    let mut sink: Option<Sink> = None;

    while let Ok(request) = request_rx.recv() {
        match request {
            PlayerRequest::Load { path, reply } => {
                let result = open_decoder(&path).map(|decoder| {
                    loaded = Some(decoder);
                });
                let _ = reply.send(result);
            }

            PlayerRequest::Play { reply } => {
                let result = match loaded.take() {
                    Some(source) => {
                        // Single channel: the new clip cuts off the old one.
                        if let Some(previous) = sink.take() {
                            previous.stop();
                        }
                        let next = Sink::connect_new(stream.mixer());
                        next.append(source);
                        sink = Some(next);
                        Ok(())
                    }
                    None => Err(AudioError::NothingLoaded),
                };
                let _ = reply.send(result);
            }

            PlayerRequest::IsBusy { reply } => {
                let busy = sink.as_ref().map(|s| !s.empty()).unwrap_or(false);
                let _ = reply.send(busy);
            }

            PlayerRequest::Stop { reply } => {
                if let Some(current) = sink.take() {
                    current.stop();
                }
                loaded = None;
                let _ = reply.send(());
            }

            PlayerRequest::Shutdown => break,
        }
    }

    if let Some(current) = sink.take() {
        current.stop();
    }
    tracing::debug!("Audio player stopped");
}

fn open_decoder(path: &Path) -> crate::Result<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
