//! Numeric id allocation backed by a document.
//!
//! An [`IdAllocator`] hands out small integer ids from two bounded domains and
//! persists every assignment as an integer property, so an id chosen on the
//! first run is honored on every later one. Before accepting a slot it asks a
//! [`ReservationOracle`] whether the host already uses it.
//!
//! ## Address spaces
//!
//! | Domain | Valid ids | Bitmap address |
//! |--------|-----------|----------------|
//! | [`Domain::Primary`] | `0..primary_capacity` | the id |
//! | [`Domain::Secondary`] | `0..secondary_capacity - secondary_shift` | id + `secondary_shift` |
//!
//! The oracle is always queried with the bitmap address.
//!
//! ```rust
//! use cfgtree::{AllocatorConfig, Document, DocumentOptions, Domain, IdAllocator};
//!
//! let config = AllocatorConfig { primary_capacity: 16, ..AllocatorConfig::default() };
//! let mut ids = IdAllocator::new(config, |_: Domain, slot: usize| slot == 5);
//! let mut doc = Document::new(DocumentOptions::default());
//!
//! assert_eq!(ids.get_or_assign_default(&mut doc, "torch", 4, Domain::Primary)?, 4);
//! // 5 is reserved by the host, so the highest free slot is used instead.
//! assert_eq!(ids.get_or_assign_default(&mut doc, "lamp", 5, Domain::Primary)?, 15);
//! # Ok::<(), cfgtree::Error>(())
//! ```

use crate::{Document, Error, Result};
use std::fmt;
use std::ops::Range;
use tracing::{debug, warn};

/// Stored value meaning "no id assigned yet".
pub const UNASSIGNED: i32 = -1;

const WORD_BITS: usize = u64::BITS as usize;

/// One of the two id spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Primary,
    Secondary,
}

impl Domain {
    /// Category used by [`IdAllocator::get_or_assign_default`].
    #[must_use]
    pub const fn default_category(&self) -> &'static str {
        match self {
            Domain::Primary => "primary",
            Domain::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_category())
    }
}

/// The host's view of which slots are already taken outside the configuration.
pub trait ReservationOracle {
    /// Returns `true` if `slot` (a bitmap address) must not be handed out.
    fn is_reserved(&self, domain: Domain, slot: usize) -> bool;
}

impl<F> ReservationOracle for F
where
    F: Fn(Domain, usize) -> bool,
{
    fn is_reserved(&self, domain: Domain, slot: usize) -> bool {
        self(domain, slot)
    }
}

/// An oracle that reserves nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReservations;

impl ReservationOracle for NoReservations {
    fn is_reserved(&self, _domain: Domain, _slot: usize) -> bool {
        false
    }
}

/// Domain sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocatorConfig {
    pub primary_capacity: usize,
    pub secondary_capacity: usize,
    /// First bitmap address of the secondary domain.
    pub secondary_shift: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig {
            primary_capacity: 4096,
            secondary_capacity: 32000,
            secondary_shift: 256,
        }
    }
}

/// A fixed-size bitmap, one bit per slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occupancy {
    words: Vec<u64>,
    len: usize,
}

impl Occupancy {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Occupancy {
            words: vec![0; (len + WORD_BITS - 1) / WORD_BITS],
            len,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Out-of-range slots read as occupied.
    #[must_use]
    pub fn is_occupied(&self, slot: usize) -> bool {
        slot >= self.len || self.words[slot / WORD_BITS] & (1 << (slot % WORD_BITS)) != 0
    }

    /// Marks `slot` occupied. Returns `false` if it is out of range.
    pub fn occupy(&mut self, slot: usize) -> bool {
        if slot >= self.len {
            return false;
        }
        self.words[slot / WORD_BITS] |= 1 << (slot % WORD_BITS);
        true
    }

    pub fn release(&mut self, slot: usize) {
        if slot < self.len {
            self.words[slot / WORD_BITS] &= !(1 << (slot % WORD_BITS));
        }
    }

    #[must_use]
    pub fn count_occupied(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Assigns and remembers ids in two bounded domains.
pub struct IdAllocator<O> {
    primary: Occupancy,
    secondary: Occupancy,
    shift: usize,
    oracle: O,
}

impl<O: ReservationOracle> IdAllocator<O> {
    pub fn new(config: AllocatorConfig, oracle: O) -> Self {
        let cap = |n: usize| n.min(i32::MAX as usize);
        IdAllocator {
            primary: Occupancy::new(cap(config.primary_capacity)),
            secondary: Occupancy::new(cap(config.secondary_capacity)),
            shift: config.secondary_shift,
            oracle,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    #[must_use]
    pub fn occupancy(&self, domain: Domain) -> &Occupancy {
        match domain {
            Domain::Primary => &self.primary,
            Domain::Secondary => &self.secondary,
        }
    }

    fn occupancy_mut(&mut self, domain: Domain) -> &mut Occupancy {
        match domain {
            Domain::Primary => &mut self.primary,
            Domain::Secondary => &mut self.secondary,
        }
    }

    fn addresses(&self, domain: Domain) -> Range<usize> {
        match domain {
            Domain::Primary => 0..self.primary.len(),
            Domain::Secondary => self.shift.min(self.secondary.len())..self.secondary.len(),
        }
    }

    /// Bitmap address of `id`, or `None` if the id lies outside the domain.
    fn address(&self, domain: Domain, id: i32) -> Option<usize> {
        let id = usize::try_from(id).ok()?;
        let address = match domain {
            Domain::Primary => id,
            Domain::Secondary => id.checked_add(self.shift)?,
        };
        self.addresses(domain).contains(&address).then_some(address)
    }

    fn id_at(&self, domain: Domain, address: usize) -> i32 {
        let id = match domain {
            Domain::Primary => address,
            Domain::Secondary => address - self.shift,
        };
        // Capacities are clamped to i32::MAX in `new`.
        id as i32
    }

    fn is_free(&self, domain: Domain, address: usize) -> bool {
        !self.occupancy(domain).is_occupied(address) && !self.oracle.is_reserved(domain, address)
    }

    /// Marks `id` as taken without persisting anything. Returns `false` if it
    /// lies outside the domain.
    pub fn mark(&mut self, domain: Domain, id: i32) -> bool {
        match self.address(domain, id) {
            Some(address) => self.occupancy_mut(domain).occupy(address),
            None => false,
        }
    }

    /// `true` if `id` is inside the domain and has been handed out or marked.
    #[must_use]
    pub fn is_taken(&self, domain: Domain, id: i32) -> bool {
        self.address(domain, id)
            .is_some_and(|address| self.occupancy(domain).is_occupied(address))
    }

    /// Returns the id stored at `category`/`key`, assigning one first if there is none.
    ///
    /// A stored id is honored as is. Otherwise `default_id` is taken if both the
    /// bitmap and the oracle consider it free, else the highest free slot of
    /// the domain. The result is written back into the document.
    ///
    /// `category` is a dotted path like any other category argument; `key` is
    /// used literally even if it contains a dot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdsExhausted`] if the domain has no free slot left.
    pub fn get_or_assign(
        &mut self,
        doc: &mut Document,
        category: &str,
        key: &str,
        default_id: i32,
        domain: Domain,
    ) -> Result<i32> {
        let prop = doc.get_int(category, key, UNASSIGNED);
        let stored = prop.as_int(UNASSIGNED);

        if stored != UNASSIGNED {
            if let Some(address) = self.address(domain, stored) {
                self.occupancy_mut(domain).occupy(address);
                return Ok(stored);
            }
            warn!(%domain, category, key, id = stored, "stored id is out of range, reassigning");
        }

        let address = match self.address(domain, default_id) {
            Some(address) if self.is_free(domain, address) => address,
            _ => self
                .addresses(domain)
                .rev()
                .find(|&address| self.is_free(domain, address))
                .ok_or_else(|| Error::ids_exhausted(domain, key))?,
        };

        let id = self.id_at(domain, address);
        self.occupancy_mut(domain).occupy(address);
        prop.set(id);
        debug!(%domain, category, key, id, requested = default_id, "assigned id");
        Ok(id)
    }

    /// [`IdAllocator::get_or_assign`] in the domain's default category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdsExhausted`] if the domain has no free slot left.
    pub fn get_or_assign_default(
        &mut self,
        doc: &mut Document,
        key: &str,
        default_id: i32,
        domain: Domain,
    ) -> Result<i32> {
        self.get_or_assign(doc, domain.default_category(), key, default_id, domain)
    }
}

impl<O> fmt::Debug for IdAllocator<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdAllocator")
            .field("primary", &self.primary.count_occupied())
            .field("secondary", &self.secondary.count_occupied())
            .field("shift", &self.shift)
            .finish_non_exhaustive()
    }
}
