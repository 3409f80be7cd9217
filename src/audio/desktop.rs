use super::{AudioTransport, STATE_PAUSED, STATE_PLAYING, STATE_STOPPED};
use crate::model::MAX_VOLUME;
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Track(u16),
    Folder(u8, u16),
}

pub struct DesktopModule {
    stream: OutputStream,
    sink: Sink,
    root: PathBuf,
    position: Option<Position>,
    volume: u8,
}

impl DesktopModule {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("music directory {} not found", root.display());
        }

        let mut stream = OutputStreamBuilder::from_default_device()
            .context("failed to open default system output stream")?
            .with_error_callback(|_| {})
            .open_stream_or_fallback()
            .context("failed to start default output stream")?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());

        Ok(Self {
            stream,
            sink,
            root: root.to_path_buf(),
            position: None,
            volume: MAX_VOLUME,
        })
    }

    fn track_path(&self, track: u16) -> PathBuf {
        self.root.join("mp3").join(format!("{track:04}.mp3"))
    }

    fn folder_files(&self, folder: u8) -> Vec<PathBuf> {
        let dir = self.root.join(format!("{folder:02}"));
        let mut files: Vec<PathBuf> = WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(OsStr::to_str)
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
            })
            .collect();
        files.sort();
        files
    }

    fn restart_sink(&mut self) {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.sink.set_volume(f32::from(self.volume) / f32::from(MAX_VOLUME));
    }

    fn append(&self, path: &Path) -> Result<()> {
        let file =
            File::open(path).with_context(|| format!("failed to open track {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        self.sink.append(source);
        Ok(())
    }

    fn seek(&mut self, position: Position) {
        self.restart_sink();
        self.position = Some(position);
        let result = match position {
            Position::Track(track) => self.append(&self.track_path(track)),
            Position::Folder(folder, index) => {
                let skip = usize::from(index.max(1)) - 1;
                self.folder_files(folder)
                    .iter()
                    .skip(skip)
                    .try_for_each(|path| self.append(path))
            }
        };
        if let Err(err) = result {
            warn!("desktop module: {err:#}");
        }
    }
}

impl AudioTransport for DesktopModule {
    fn play(&mut self, track: u16) {
        self.seek(Position::Track(track));
    }

    fn play_large_folder(&mut self, folder: u8, index: u16) {
        self.seek(Position::Folder(folder, index));
    }

    fn next(&mut self) {
        let next = match self.position {
            Some(Position::Track(track)) => Position::Track(track.saturating_add(1)),
            Some(Position::Folder(folder, index)) => Position::Folder(folder, index.saturating_add(1)),
            None => Position::Track(1),
        };
        self.seek(next);
    }

    fn previous(&mut self) {
        let previous = match self.position {
            Some(Position::Track(track)) => Position::Track(track.saturating_sub(1).max(1)),
            Some(Position::Folder(folder, index)) => {
                Position::Folder(folder, index.saturating_sub(1).max(1))
            }
            None => Position::Track(1),
        };
        self.seek(previous);
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn start(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.position = None;
    }

    fn volume(&mut self, volume: u8) {
        self.volume = volume.min(MAX_VOLUME);
        self.sink
            .set_volume(f32::from(self.volume) / f32::from(MAX_VOLUME));
    }

    fn read_state(&mut self) -> u8 {
        if self.sink.empty() {
            STATE_STOPPED
        } else if self.sink.is_paused() {
            STATE_PAUSED
        } else {
            STATE_PLAYING
        }
    }

    fn name(&self) -> &str {
        "desktop audio"
    }
}
