//-
// Copyright (c) 2026, Jason Lingle
//
// This file is part of Vmailadm.
//
// Vmailadm is free software: you can redistribute it and/or modify it under the
// terms  of the GNU  General Public License  as published by  the Free Software
// Foundation,  either version 3  of the License,  or (at your option) any later
// version.
//
// Vmailadm  is distributed in  the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
// A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// Vmailadm. If not, see <http://www.gnu.org/licenses/>.

/// Determine whether the given name is "safe" as a single path element.
///
/// Mailbox local parts and domains become directories under the vmail base,
/// so this excludes empty names and anything that causes directory traversal
/// or hidden files. It also rejects the characters which have special meaning
/// in the text formats we write: whitespace (Postfix map keys) and `:`
/// (Dovecot passwd-file fields).
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty() &&
        // Block directory traversal through .. and creation of hidden files
        name.chars().next() != Some('.') &&
        name.find('/').is_none() &&
        name.find('\\').is_none() &&
        name.find(':').is_none() &&
        name.find(|c: char| c.is_whitespace()).is_none() &&
        // Don't allow any ASCII control characters
        name.find(|c| c < ' ' || c == '\x7F').is_none()
}
