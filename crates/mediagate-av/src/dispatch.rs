//! Transcode dispatch: profile lookup, output MIME type, and process start.

use std::sync::Arc;

use mediagate_core::config::CONTENT_TYPE_PCM;
use mediagate_core::{
    attr, ByteRange, ConfigProvider, ContentObject, Error, OpenMode, Resource, Result,
    TranscodingProfile,
};

use crate::command::TranscodeCommand;
use crate::stream::{DeclaredLength, PipeSource, StreamHandle};
use crate::template::TemplateContext;
use crate::tools::resolve_tool;

/// Append `;rate=` and `;channels=` to a PCM MIME type.
///
/// Only applies when the configured mapping classifies `mime` as raw PCM.
/// Each parameter comes from the primary resource and is appended only when
/// that attribute is present.
pub fn augment_pcm_mime(
    mime: &str,
    config: &dyn ConfigProvider,
    primary: Option<&Resource>,
) -> String {
    let mut out = mime.to_string();
    if config.content_type_for(mime) != Some(CONTENT_TYPE_PCM) {
        return out;
    }
    let Some(res) = primary else {
        return out;
    };
    if let Some(rate) = res.attribute(attr::SAMPLE_FREQUENCY) {
        out.push_str(";rate=");
        out.push_str(rate);
    }
    if let Some(channels) = res.attribute(attr::NR_AUDIO_CHANNELS) {
        out.push_str(";channels=");
        out.push_str(channels);
    }
    out
}

/// Starts external transcoders for items.
///
/// Every dispatch owns its own process; nothing is pooled or shared between
/// requests.
#[derive(Clone)]
pub struct TranscodeDispatcher {
    config: Arc<dyn ConfigProvider>,
}

impl TranscodeDispatcher {
    pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
        Self { config }
    }

    /// Exact-name profile lookup. Never falls back to a similar name.
    pub fn profile(&self, name: &str) -> Result<&TranscodingProfile> {
        self.config
            .transcoding_profile(name)
            .ok_or_else(|| Error::profile_not_found(name))
    }

    /// Content type of the transcoder's output for `object`.
    pub fn content_type(&self, profile: &TranscodingProfile, object: &ContentObject) -> String {
        augment_pcm_mime(
            &profile.mime_type,
            self.config.as_ref(),
            object.primary_resource(),
        )
    }

    /// Transcoded output never has a predictable byte count.
    pub fn declared_length(&self, profile: &TranscodingProfile) -> DeclaredLength {
        if profile.is_chunked(self.config.chunked_transfer()) {
            DeclaredLength::Chunked
        } else {
            DeclaredLength::Unknown
        }
    }

    /// Build the process invocation for `object` without starting it.
    pub fn command(
        &self,
        profile: &TranscodingProfile,
        object: &ContentObject,
        range: Option<ByteRange>,
    ) -> Result<TranscodeCommand> {
        let input = object.require_item()?;
        let program = resolve_tool(&profile.command)?;

        let ctx = TemplateContext::new()
            .with_input(input)
            .with_range(range)
            .with_var("mime", &profile.mime_type);

        let mut cmd = TranscodeCommand::new(program);
        cmd.args(ctx.render_args(&profile.args))
            .stderr(profile.stderr);
        Ok(cmd)
    }

    /// Start the named profile on `object` and return an open handle reading
    /// the transcoder's stdout.
    ///
    /// # Errors
    ///
    /// - [`Error::ProfileNotFound`] if no profile has exactly this name; no
    ///   process is started.
    /// - [`Error::NotAnItem`] for containers.
    /// - [`Error::Tool`] if the command cannot be resolved or spawned.
    pub async fn serve_content(
        &self,
        profile_name: &str,
        object: &ContentObject,
        range: Option<ByteRange>,
    ) -> Result<StreamHandle> {
        let profile = self.profile(profile_name)?;
        let cmd = self.command(profile, object, range)?;
        tracing::debug!(
            profile = %profile.name,
            program = %cmd.program_name(),
            args = ?cmd.get_args(),
            "starting transcoder"
        );

        let mut handle = StreamHandle::new(PipeSource::new(cmd, self.config.termination_grace()));
        handle.open(OpenMode::Read).await?;
        tracing::info!(
            pid = handle.process_id(),
            profile = %profile.name,
            object_id = %object.id,
            "transcoder started"
        );
        Ok(handle)
    }
}

impl std::fmt::Debug for TranscodeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodeDispatcher").finish_non_exhaustive()
    }
}
