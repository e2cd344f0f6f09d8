//! Track library - metadata, playlists, and collaborator permissions

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Metadata for a track in the library
///
/// `path` points at the audio file on disk; the decoded PCM lives in
/// [`crate::loader::LoadedTrack`] once a deck loads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Beats per minute, 0.0 if not analyzed
    #[serde(default)]
    pub bpm: f64,
    /// Musical key as displayed ("Am", "F#", ...)
    #[serde(default)]
    pub key: String,
    /// Duration in seconds, 0.0 if unknown
    #[serde(default)]
    pub duration: f64,
    /// Audio file location
    #[serde(default)]
    pub path: PathBuf,
    /// Cover art location, if any
    #[serde(default)]
    pub cover_art: Option<PathBuf>,
}

/// What a collaborator may do with a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionRole {
    Owner,
    Editor,
    Viewer,
}

impl PermissionRole {
    /// Whether this role may modify the playlist contents
    pub fn can_edit(&self) -> bool {
        matches!(self, PermissionRole::Owner | PermissionRole::Editor)
    }
}

/// A user with access to a shared playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    pub user_id: String,
    pub name: String,
    pub role: PermissionRole,
}

/// One entry in a playlist, remembering who added it and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub track_id: String,
    pub added_by: String,
    pub added_at: DateTime<Local>,
}

/// A shareable, ordered collection of tracks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    /// Visible to users outside the collaborator list
    #[serde(default)]
    pub is_public: bool,
    /// Whether non-owner collaborators may edit; when false the
    /// playlist is effectively read-only for everyone but the owner
    #[serde(default)]
    pub allow_collaboration: bool,
    pub entries: Vec<PlaylistEntry>,
    pub collaborators: Vec<Collaborator>,
}

impl Playlist {
    pub fn new(id: impl Into<String>, name: impl Into<String>, owner: Collaborator) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_public: false,
            allow_collaboration: true,
            entries: Vec::new(),
            collaborators: vec![owner],
        }
    }

    /// Role of a user on this playlist, if they have access at all
    pub fn role_of(&self, user_id: &str) -> Option<PermissionRole> {
        self.collaborators
            .iter()
            .find(|c| c.user_id == user_id)
            .map(|c| c.role)
    }

    /// Whether a user may modify this playlist
    pub fn can_edit(&self, user_id: &str) -> bool {
        match self.role_of(user_id) {
            Some(PermissionRole::Owner) => true,
            Some(role) => self.allow_collaboration && role.can_edit(),
            None => false,
        }
    }

    /// Append a track; refused (returns false) for viewers and strangers
    pub fn add_track(&mut self, track_id: impl Into<String>, user_id: &str) -> bool {
        if !self.can_edit(user_id) {
            return false;
        }
        self.entries.push(PlaylistEntry {
            track_id: track_id.into(),
            added_by: user_id.to_string(),
            added_at: Local::now(),
        });
        true
    }

    /// Remove the first entry for a track; refused for viewers
    pub fn remove_track(&mut self, track_id: &str, user_id: &str) -> bool {
        if !self.can_edit(user_id) {
            return false;
        }
        if let Some(pos) = self.entries.iter().position(|e| e.track_id == track_id) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    /// Add or replace a collaborator; only the owner may share
    pub fn share_with(&mut self, sharer_id: &str, collaborator: Collaborator) -> bool {
        if self.role_of(sharer_id) != Some(PermissionRole::Owner) {
            return false;
        }
        if let Some(existing) = self
            .collaborators
            .iter_mut()
            .find(|c| c.user_id == collaborator.user_id)
        {
            *existing = collaborator;
        } else {
            self.collaborators.push(collaborator);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-memory track library with playlists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    pub tracks: Vec<Track>,
    pub playlists: Vec<Playlist>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track, replacing any previous entry with the same id
    pub fn add_track(&mut self, track: Track) {
        if let Some(existing) = self.tracks.iter_mut().find(|t| t.id == track.id) {
            *existing = track;
        } else {
            self.tracks.push(track);
        }
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn remove_track(&mut self, id: &str) -> Option<Track> {
        let pos = self.tracks.iter().position(|t| t.id == id)?;
        // Drop dangling playlist entries along with the track
        for playlist in &mut self.playlists {
            playlist.entries.retain(|e| e.track_id != id);
        }
        Some(self.tracks.remove(pos))
    }

    pub fn playlist(&self, id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    pub fn playlist_mut(&mut self, id: &str) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|p| p.id == id)
    }

    pub fn add_playlist(&mut self, playlist: Playlist) {
        self.playlists.push(playlist);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Collaborator {
        Collaborator {
            user_id: "u1".into(),
            name: "Alex".into(),
            role: PermissionRole::Owner,
        }
    }

    #[test]
    fn test_roles() {
        assert!(PermissionRole::Owner.can_edit());
        assert!(PermissionRole::Editor.can_edit());
        assert!(!PermissionRole::Viewer.can_edit());
    }

    #[test]
    fn test_viewer_cannot_modify() {
        let mut playlist = Playlist::new("p1", "Warmup", owner());
        playlist.collaborators.push(Collaborator {
            user_id: "u2".into(),
            name: "Sam".into(),
            role: PermissionRole::Viewer,
        });

        assert!(!playlist.add_track("t1", "u2"));
        assert!(playlist.is_empty());

        assert!(playlist.add_track("t1", "u1"));
        assert!(!playlist.remove_track("t1", "u2"));
        assert_eq!(playlist.len(), 1);
    }

    #[test]
    fn test_only_owner_shares() {
        let mut playlist = Playlist::new("p1", "Peak Time", owner());
        let editor = Collaborator {
            user_id: "u2".into(),
            name: "Sam".into(),
            role: PermissionRole::Editor,
        };
        assert!(playlist.share_with("u1", editor.clone()));
        assert!(playlist.can_edit("u2"));

        // Editors cannot grant access further
        let viewer = Collaborator {
            user_id: "u3".into(),
            name: "Kim".into(),
            role: PermissionRole::Viewer,
        };
        assert!(!playlist.share_with("u2", viewer));
        assert_eq!(playlist.role_of("u3"), None);
    }

    #[test]
    fn test_collaboration_toggle_locks_out_editors() {
        let mut playlist = Playlist::new("p1", "After Hours", owner());
        let editor = Collaborator {
            user_id: "u2".into(),
            name: "Sam".into(),
            role: PermissionRole::Editor,
        };
        assert!(playlist.share_with("u1", editor));

        playlist.allow_collaboration = false;
        assert!(!playlist.can_edit("u2"));
        assert!(!playlist.add_track("t1", "u2"));

        // The owner is never locked out
        assert!(playlist.add_track("t1", "u1"));
        assert_eq!(playlist.len(), 1);
    }

    #[test]
    fn test_stranger_has_no_access() {
        let mut playlist = Playlist::new("p1", "Closing", owner());
        assert_eq!(playlist.role_of("nobody"), None);
        assert!(!playlist.add_track("t1", "nobody"));
    }

    #[test]
    fn test_library_track_upsert_and_removal() {
        let mut lib = Library::new();
        lib.add_track(Track {
            id: "t1".into(),
            title: "First".into(),
            ..Track::default()
        });
        lib.add_track(Track {
            id: "t1".into(),
            title: "Renamed".into(),
            ..Track::default()
        });
        assert_eq!(lib.tracks.len(), 1);
        assert_eq!(lib.track("t1").map(|t| t.title.as_str()), Some("Renamed"));

        let mut playlist = Playlist::new("p1", "Set", owner());
        playlist.add_track("t1", "u1");
        lib.add_playlist(playlist);

        lib.remove_track("t1");
        assert!(lib.track("t1").is_none());
        assert!(lib.playlist("p1").is_some_and(|p| p.is_empty()));
    }
}
