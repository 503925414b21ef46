//! Live microphone capture through cpal.
//!
//! Opening a device can block or fail, so it happens on a helper thread. The
//! caller gets a [`MicrophoneRequest`] immediately and polls it from the frame
//! loop; the grant arrives as a [`MicrophoneStream`] whose drop stops capture.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, SupportedStreamConfig};

use super::analyser::Tap;
use super::source::Microphone;
use crate::error::{Error, Result};

/// Pending microphone acquisition.
pub struct MicrophoneRequest {
    rx: Receiver<Result<MicrophoneStream>>,
}

impl MicrophoneRequest {
    pub fn new(rx: Receiver<Result<MicrophoneStream>>) -> Self {
        Self { rx }
    }

    /// `None` while the device is still being opened.
    pub fn poll(&self) -> Option<Result<MicrophoneStream>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(Error::Microphone(
                "capture thread exited before granting access".into(),
            ))),
        }
    }
}

/// A running capture. Dropping it stops the device.
pub struct MicrophoneStream {
    device_name: String,
    stop_tx: Option<Sender<()>>,
}

impl MicrophoneStream {
    pub fn new(device_name: impl Into<String>, stop_tx: Option<Sender<()>>) -> Self {
        Self {
            device_name: device_name.into(),
            stop_tx,
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for MicrophoneStream {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Default input device of the default cpal host.
#[derive(Default)]
pub struct CpalMicrophone;

impl Microphone for CpalMicrophone {
    fn request(&mut self, tap: Tap) -> MicrophoneRequest {
        let (result_tx, result_rx) = mpsc::channel();
        // cpal streams are not Send; the stream lives and dies on this thread
        thread::spawn(move || {
            let (stop_tx, stop_rx) = mpsc::channel::<()>();
            match open_input(tap) {
                Ok((stream, name)) => {
                    log::info!("microphone: capturing from {name}");
                    if result_tx
                        .send(Ok(MicrophoneStream::new(name, Some(stop_tx))))
                        .is_err()
                    {
                        return;
                    }
                    // Blocks until the MicrophoneStream is dropped
                    let _ = stop_rx.recv();
                    drop(stream);
                    log::info!("microphone: capture stopped");
                }
                Err(err) => {
                    log::warn!("microphone: {err}");
                    let _ = result_tx.send(Err(err));
                }
            }
        });
        MicrophoneRequest::new(result_rx)
    }
}

fn open_input(tap: Tap) -> Result<(Stream, String)> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(Error::NoInputDevice)?;
    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    let supported = device
        .default_input_config()
        .map_err(|e| Error::Microphone(e.to_string()))?;
    log::info!(
        "microphone: {} @ {}Hz, {} channel(s), {:?}",
        name,
        supported.sample_rate().0,
        supported.channels(),
        supported.sample_format()
    );
    let stream = build_input_stream(&device, &supported, tap)?;
    stream
        .play()
        .map_err(|e| Error::Microphone(e.to_string()))?;
    Ok((stream, name))
}

fn build_input_stream(
    device: &Device,
    supported: &SupportedStreamConfig,
    tap: Tap,
) -> Result<Stream> {
    let config: StreamConfig = supported.config();
    let channels = usize::from(config.channels.max(1));
    let on_error = |err: cpal::StreamError| log::error!("microphone stream error: {err}");

    let stream = match supported.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                tap.push(&downmix(data, channels, |s| s));
            },
            on_error,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                tap.push(&downmix(data, channels, |s| s as f32 / i16::MAX as f32));
            },
            on_error,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                let half = u16::MAX as f32 / 2.0;
                tap.push(&downmix(data, channels, |s| (s as f32 - half) / half));
            },
            on_error,
            None,
        ),
        other => {
            return Err(Error::Microphone(format!(
                "unsupported sample format: {other}"
            )));
        }
    };
    stream.map_err(|e| Error::Microphone(e.to_string()))
}

/// Average interleaved frames down to mono f32.
fn downmix<T: Copy>(data: &[T], channels: usize, to_f32: impl Fn(T) -> f32) -> Vec<f32> {
    data.chunks_exact(channels)
        .map(|frame| frame.iter().map(|&s| to_f32(s)).sum::<f32>() / channels as f32)
        .collect()
}
