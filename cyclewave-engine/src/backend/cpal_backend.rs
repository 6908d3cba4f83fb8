//! Realtime output through CPAL.
//!
//! The graph is mono; every output channel gets the same sample. Streams are
//! built paused so `resume` is the only place playback begins, and `close`
//! pauses before dropping so nothing keeps running in the background.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use super::{AudioBackend, AudioContext};
use crate::error::{EngineError, EngineResult};
use crate::graph::GraphRenderer;

/// Names of the default host's output devices.
pub fn output_device_names() -> EngineResult<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.output_devices().map_err(|e| EngineError::UnsupportedPlatform(e.to_string()))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

fn pick_device(host: &cpal::Host, name: Option<&str>) -> EngineResult<cpal::Device> {
    if let Some(name) = name {
        let devices = host.output_devices().map_err(|e| EngineError::UnsupportedPlatform(e.to_string()))?;
        for d in devices {
            if d.name().is_ok_and(|n| n == name) {
                return Ok(d);
            }
        }
        return Err(EngineError::UnsupportedPlatform(format!("requested device not found: {name}")));
    }
    host.default_output_device()
        .ok_or_else(|| EngineError::UnsupportedPlatform("no default output device".into()))
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    mut renderer: GraphRenderer,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = usize::from(cfg.channels).max(1);
    device.build_output_stream(
        cfg,
        move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
            renderer.drain_commands();
            for frame in output.chunks_mut(channels) {
                let s = renderer.next_sample().clamp(-1.0, 1.0);
                let v: T = T::from_sample(s);
                for ch in frame.iter_mut() {
                    *ch = v;
                }
            }
        },
        |e: cpal::StreamError| error!("cpal stream error: {e}"),
        None,
    )
}

/// Opens one output stream per play session on the default (or named) device.
#[derive(Clone, Debug, Default)]
pub struct CpalBackend {
    device_name: Option<String>,
}

impl CpalBackend {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl AudioBackend for CpalBackend {
    type Context = CpalContext;

    fn open(&mut self, mut renderer: GraphRenderer) -> EngineResult<CpalContext> {
        let host = cpal::default_host();
        let device = pick_device(&host, self.device_name.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        let supported = device
            .default_output_config()
            .map_err(|e| EngineError::UnsupportedPlatform(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.config();

        #[allow(clippy::cast_precision_loss)]
        let sr = config.sample_rate.0 as f32;
        renderer.set_sample_rate(sr);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, renderer),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, renderer),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, renderer),
            other => {
                return Err(EngineError::UnsupportedPlatform(format!("unsupported device sample format: {other:?}")))
            }
        }
        .map_err(|e| EngineError::UnsupportedPlatform(e.to_string()))?;

        // some hosts start streams on build
        if let Err(e) = stream.pause() {
            debug!("cpal: initial pause not supported: {e}");
        }

        info!(device = %device_name, sr, channels = config.channels, ?sample_format, "cpal: stream opened");
        Ok(CpalContext { stream: Some(stream), sample_rate: sr, suspended: true })
    }
}

pub struct CpalContext {
    stream: Option<cpal::Stream>,
    sample_rate: f32,
    suspended: bool,
}

impl AudioContext for CpalContext {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> EngineResult<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| EngineError::UnsupportedPlatform("stream already closed".into()))?;
        stream.play().map_err(|e| EngineError::UnsupportedPlatform(e.to_string()))?;
        self.suspended = false;
        Ok(())
    }

    fn close(&mut self) -> EngineResult<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        let paused = stream.pause();
        drop(stream);
        debug!("cpal: stream closed");
        paused.map_err(|e| EngineError::ResourceRelease(e.to_string()))
    }
}

impl core::fmt::Debug for CpalContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CpalContext")
            .field("sr", &self.sample_rate)
            .field("suspended", &self.suspended)
            .field("open", &self.stream.is_some())
            .finish()
    }
}
