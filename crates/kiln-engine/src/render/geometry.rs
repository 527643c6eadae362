use super::device::GpuDevice;
use super::handle::{GeometryHandle, GeometryKind, HandleArena};
use super::vertex::Vertex;

/// A compiled geometry: GPU buffers plus the counts needed to draw them.
#[derive(Debug, Clone)]
pub struct GeometryEntry<G> {
    pub gpu: G,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Shape problems found in caller-supplied geometry.
///
/// These are reported, not rejected: the upload proceeds as given.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct GeometryIssues {
    /// Index count is not a multiple of 3; the trailing indices form no triangle.
    pub partial_triangle: bool,
    /// Number of indices `>= vertex_count`.
    pub out_of_range: usize,
}

impl GeometryIssues {
    pub fn scan(vertex_count: usize, indices: &[u32]) -> Self {
        Self {
            partial_triangle: indices.len() % 3 != 0,
            out_of_range: indices.iter().filter(|&&i| i as usize >= vertex_count).count(),
        }
    }

    #[inline]
    pub fn is_clean(self) -> bool {
        !self.partial_triangle && self.out_of_range == 0
    }
}

/// Owns compiled geometry keyed by [`GeometryHandle`].
pub struct GeometryTable<D: GpuDevice> {
    entries: HandleArena<GeometryKind, GeometryEntry<D::Geometry>>,
}

impl<D: GpuDevice> Default for GeometryTable<D> {
    fn default() -> Self {
        Self { entries: HandleArena::new() }
    }
}

impl<D: GpuDevice> GeometryTable<D> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, handle: GeometryHandle) -> Option<&GeometryEntry<D::Geometry>> {
        self.entries.get(handle)
    }

    /// Uploads `vertices`/`indices` and returns a fresh handle.
    ///
    /// The slices are copied; the caller may drop them as soon as this returns.
    /// Returns [`GeometryHandle::NONE`] only if the handle space is exhausted.
    pub fn compile(&mut self, device: &mut D, vertices: &[Vertex], indices: &[u32]) -> GeometryHandle {
        let issues = GeometryIssues::scan(vertices.len(), indices);
        if !issues.is_clean() {
            log::warn!(
                "geometry with {} vertices / {} indices is malformed: partial triangle: {}, \
                 out-of-range indices: {}",
                vertices.len(),
                indices.len(),
                issues.partial_triangle,
                issues.out_of_range
            );
        }

        let entry = GeometryEntry {
            gpu: device.create_geometry(vertices, indices),
            vertex_count: u32::try_from(vertices.len()).unwrap_or(u32::MAX),
            index_count: u32::try_from(indices.len()).unwrap_or(u32::MAX),
        };

        match self.entries.insert(entry) {
            Ok(handle) => {
                log::trace!("compiled geometry {handle:?} ({} indices)", indices.len());
                handle
            }
            Err(entry) => {
                log::error!("geometry handle space exhausted; dropping upload");
                device.release_geometry(entry.gpu);
                GeometryHandle::NONE
            }
        }
    }

    /// Frees the GPU buffers behind `handle`. Unknown handles are ignored.
    pub fn release(&mut self, device: &mut D, handle: GeometryHandle) -> bool {
        let Some(entry) = self.entries.remove(handle) else {
            log::trace!("release of unknown geometry {handle:?} ignored");
            return false;
        };
        device.release_geometry(entry.gpu);
        log::trace!("released geometry {handle:?}");
        true
    }

    /// Frees everything still live; returns how many entries there were.
    pub fn release_all(&mut self, device: &mut D) -> usize {
        let drained = self.entries.drain();
        let count = drained.len();
        for (_, entry) in drained {
            device.release_geometry(entry.gpu);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{quad, RecordingDevice};

    #[test]
    fn compile_then_release_leaves_table_unchanged() {
        let mut device = RecordingDevice::default();
        let mut table = GeometryTable::<RecordingDevice>::new();
        let (vertices, indices) = quad(0.0, 0.0, 10.0, 10.0);

        let keep = table.compile(&mut device, &vertices, &indices);
        let before = table.len();

        let h = table.compile(&mut device, &vertices, &indices);
        assert!(table.release(&mut device, h));

        assert_eq!(table.len(), before);
        assert!(table.get(keep).is_some());
        assert_eq!(device.live_geometries(), 1);
    }

    #[test]
    fn entry_records_counts() {
        let mut device = RecordingDevice::default();
        let mut table = GeometryTable::<RecordingDevice>::new();
        let (vertices, indices) = quad(0.0, 0.0, 1.0, 1.0);

        let h = table.compile(&mut device, &vertices, &indices);
        let entry = table.get(h).unwrap();
        assert_eq!(entry.vertex_count, 4);
        assert_eq!(entry.index_count, 6);
    }

    #[test]
    fn caller_buffers_are_copied() {
        let mut device = RecordingDevice::default();
        let mut table = GeometryTable::<RecordingDevice>::new();
        let h = {
            let (vertices, indices) = quad(1.0, 2.0, 3.0, 4.0);
            table.compile(&mut device, &vertices, &indices)
        };
        let entry = table.get(h).unwrap();
        assert_eq!(device.geometry(&entry.gpu).indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn successive_handles_increase() {
        let mut device = RecordingDevice::default();
        let mut table = GeometryTable::<RecordingDevice>::new();
        let (vertices, indices) = quad(0.0, 0.0, 1.0, 1.0);

        let a = table.compile(&mut device, &vertices, &indices);
        let b = table.compile(&mut device, &vertices, &indices);
        table.release(&mut device, a);
        let c = table.compile(&mut device, &vertices, &indices);
        assert!(a < b && b < c);
    }

    #[test]
    fn double_release_is_harmless() {
        let mut device = RecordingDevice::default();
        let mut table = GeometryTable::<RecordingDevice>::new();
        let (vertices, indices) = quad(0.0, 0.0, 1.0, 1.0);

        let a = table.compile(&mut device, &vertices, &indices);
        let b = table.compile(&mut device, &vertices, &indices);
        assert!(table.release(&mut device, a));
        assert!(!table.release(&mut device, a));

        assert!(table.get(b).is_some());
        assert_eq!(device.geometries_released, 1);
    }

    #[test]
    fn release_unknown_handles_is_noop() {
        let mut device = RecordingDevice::default();
        let mut table = GeometryTable::<RecordingDevice>::new();
        assert!(!table.release(&mut device, GeometryHandle::NONE));
        assert!(!table.release(&mut device, GeometryHandle::from_raw(u64::MAX)));
        assert_eq!(device.geometries_released, 0);
    }

    #[test]
    fn malformed_geometry_is_uploaded_as_given() {
        let mut device = RecordingDevice::default();
        let mut table = GeometryTable::<RecordingDevice>::new();
        let (vertices, _) = quad(0.0, 0.0, 1.0, 1.0);
        let indices = [0, 1, 9, 3];

        let issues = GeometryIssues::scan(vertices.len(), &indices);
        assert!(issues.partial_triangle);
        assert_eq!(issues.out_of_range, 1);

        let h = table.compile(&mut device, &vertices, &indices);
        assert_eq!(table.get(h).map(|e| e.index_count), Some(4));
    }

    #[test]
    fn release_all_frees_every_entry() {
        let mut device = RecordingDevice::default();
        let mut table = GeometryTable::<RecordingDevice>::new();
        let (vertices, indices) = quad(0.0, 0.0, 1.0, 1.0);
        table.compile(&mut device, &vertices, &indices);
        table.compile(&mut device, &vertices, &indices);

        assert_eq!(table.release_all(&mut device), 2);
        assert!(table.is_empty());
        assert_eq!(device.live_geometries(), 0);
    }
}
