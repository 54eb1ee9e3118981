use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

pub const CASCADE_FILENAME: &str = "haarcascade_frontalface_default.xml";
const CASCADE_URL: &str = "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_frontalface_default.xml";

// Where distro and Homebrew OpenCV packages install their cascades.
const SYSTEM_CASCADE_DIRS: &[&str] = &[
    "/usr/share/opencv4/haarcascades",
    "/usr/local/share/opencv4/haarcascades",
    "/opt/homebrew/share/opencv4/haarcascades",
    "/usr/share/opencv/haarcascades",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CascadeEvent {
    AlreadyPresent,
    Copied { from: PathBuf },
    Started { total: Option<u64> },
    Progress { downloaded: u64, total: Option<u64> },
    Finished,
}

/// Makes sure the cascade XML exists at `cascade_path`, copying an installed
/// OpenCV copy or downloading it otherwise.
pub fn ensure_cascade_ready<F>(cascade_path: &Path, mut on_event: F) -> anyhow::Result<()>
where
    F: FnMut(CascadeEvent),
{
    let system_dirs: Vec<PathBuf> = SYSTEM_CASCADE_DIRS.iter().map(PathBuf::from).collect();
    ensure_cascade_from(cascade_path, &system_dirs, CASCADE_URL, &mut on_event)
}

fn ensure_cascade_from<F>(
    cascade_path: &Path,
    system_dirs: &[PathBuf],
    url: &str,
    on_event: &mut F,
) -> anyhow::Result<()>
where
    F: FnMut(CascadeEvent),
{
    if cascade_path.exists() {
        on_event(CascadeEvent::AlreadyPresent);
        on_event(CascadeEvent::Finished);
        return Ok(());
    }

    if let Some(parent) = cascade_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create cascade directory {}", parent.display()))?;
    }

    if let Some(installed) = system_dirs
        .iter()
        .map(|dir| dir.join(CASCADE_FILENAME))
        .find(|candidate| candidate.is_file())
    {
        fs::copy(&installed, cascade_path).with_context(|| {
            format!(
                "failed to copy installed cascade from {} to {}",
                installed.display(),
                cascade_path.display()
            )
        })?;
        log::info!("using installed cascade {}", installed.display());
        on_event(CascadeEvent::Copied { from: installed });
        on_event(CascadeEvent::Finished);
        return Ok(());
    }

    let mut progress: Option<ProgressBar> = None;
    download_to_path(url, cascade_path, &mut |event| {
        match &event {
            CascadeEvent::Started { total } => {
                progress = Some(create_progress_bar(*total));
            }
            CascadeEvent::Progress { downloaded, .. } => {
                if let Some(pb) = progress.as_ref() {
                    pb.set_position(*downloaded);
                }
            }
            CascadeEvent::Finished => {
                if let Some(pb) = progress.take() {
                    pb.finish_with_message("face cascade ready");
                }
            }
            CascadeEvent::AlreadyPresent | CascadeEvent::Copied { .. } => {}
        }
        on_event(event);
    })
    .with_context(|| format!("failed to download face cascade to {}", cascade_path.display()))
}

fn download_to_path<F>(url: &str, dest: &Path, on_event: &mut F) -> anyhow::Result<()>
where
    F: FnMut(CascadeEvent),
{
    log::info!("downloading face cascade from {url} to {}", dest.display());

    let client = Client::new();
    let mut response = client
        .get(url)
        .send()
        .context("failed to start cascade download")?
        .error_for_status()
        .context("cascade download returned error status")?;

    let total = response.content_length();
    on_event(CascadeEvent::Started { total });

    let tmp_path = dest.with_extension("download");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let read = response
            .read(&mut buffer)
            .context("failed while reading cascade bytes")?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])
            .context("failed while writing cascade to disk")?;
        downloaded += read as u64;
        on_event(CascadeEvent::Progress { downloaded, total });
    }

    file.sync_all()
        .context("failed to flush downloaded cascade to disk")?;
    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    on_event(CascadeEvent::Finished);
    Ok(())
}

fn create_progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            ) {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} downloading face cascade") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Never reached in these tests; a download attempt would fail loudly.
    const UNREACHABLE_URL: &str = "http://127.0.0.1:9/cascade.xml";

    fn collect(path: &Path, system_dirs: &[PathBuf]) -> (anyhow::Result<()>, Vec<CascadeEvent>) {
        let mut events = Vec::new();
        let result = ensure_cascade_from(path, system_dirs, UNREACHABLE_URL, &mut |e| events.push(e));
        (result, events)
    }

    #[test]
    fn present_cascade_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CASCADE_FILENAME);
        fs::write(&path, "<opencv_storage/>").unwrap();

        let (result, events) = collect(&path, &[]);

        result.unwrap();
        assert_eq!(events, [CascadeEvent::AlreadyPresent, CascadeEvent::Finished]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "<opencv_storage/>");
    }

    #[test]
    fn installed_cascade_is_copied_into_place() {
        let system = tempfile::tempdir().unwrap();
        fs::write(system.path().join(CASCADE_FILENAME), "<cascade/>").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join(CASCADE_FILENAME);

        let (result, events) = collect(&path, &[system.path().to_path_buf()]);

        result.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<cascade/>");
        assert_eq!(
            events,
            [
                CascadeEvent::Copied {
                    from: system.path().join(CASCADE_FILENAME)
                },
                CascadeEvent::Finished
            ]
        );
    }

    #[test]
    fn failed_download_leaves_no_cascade_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CASCADE_FILENAME);

        let (result, events) = collect(&path, &[]);

        assert!(result.is_err());
        assert!(events.is_empty());
        assert!(!path.exists());
    }
}
