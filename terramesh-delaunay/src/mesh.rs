//! Triangulation mesh structure
//!
//! An arena of triangles, vertices and subsegments navigated through
//! oriented handles. A handle is a plain `(index, orientation)` pair; all
//! topological mutation (bonding neighbors, flipping an edge) goes through
//! handle operations on the arena, and every operation is O(1).
//!
//! Index 0 of the triangle arena is the shared ghost triangle and index 0 of
//! the subsegment arena the shared ghost subsegment: universal placeholders
//! for "no neighbor" / "no subsegment". Any handle referencing them marks a
//! boundary, which keeps traversal code free of null checks. The ghost slots
//! themselves are never written; one-sided links such as the hull entry
//! point live on the arena instead. A dead triangle is marked by `NO_TRI` in
//! its first neighbor slot, which is distinct from the ghost index.

use terramesh_core::Point2d;

use crate::predicates::counterclockwise;

/// Triangle arena index of the shared ghost sentinel
pub const GHOST_TRI: u32 = 0;
/// Subsegment arena index of the shared ghost sentinel
pub const GHOST_SUB: u32 = 0;
/// Dead-triangle marker, never a valid arena index
pub const NO_TRI: u32 = u32::MAX;
/// Absent vertex slot (the apex of a hull-backing triangle)
pub const NO_VERTEX: u32 = u32::MAX;

const PLUS1MOD3: [u8; 3] = [1, 2, 0];
const MINUS1MOD3: [u8; 3] = [2, 0, 1];

/// Classification of a vertex over its arena lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// A live input vertex
    Input,
    /// A logically removed vertex (exact duplicate, or an enclosing-box
    /// corner); stays allocated until output but joins no triangle.
    Undead,
}

/// A triangulation vertex: planar coordinates plus the index of the caller's
/// auxiliary payload (the 3D surface sample it came from).
#[derive(Debug, Clone)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    /// Caller payload slot carried through to mesh output
    pub sample: u32,
    pub kind: VertexKind,
    /// Output number assigned by [`TriMesh::number_vertices`]; -1 before
    pub id: i32,
    /// Boundary marker; 1 on convex hull vertices after ghost removal
    pub mark: i32,
}

impl Vertex {
    pub fn point(&self) -> Point2d {
        Point2d::new(self.x, self.y)
    }
}

/// An oriented triangle handle: an arena index plus which of the three
/// edges/orientations it currently faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OTri {
    pub tri: u32,
    pub orient: u8,
}

impl OTri {
    pub const GHOST: OTri = OTri {
        tri: GHOST_TRI,
        orient: 0,
    };

    pub fn new(tri: u32, orient: u8) -> Self {
        Self { tri, orient }
    }

    pub fn is_ghost(&self) -> bool {
        self.tri == GHOST_TRI
    }

    /// Next edge counterclockwise within the same triangle
    #[inline]
    pub fn lnext(&self) -> OTri {
        OTri::new(self.tri, PLUS1MOD3[self.orient as usize])
    }

    /// Previous edge counterclockwise within the same triangle
    #[inline]
    pub fn lprev(&self) -> OTri {
        OTri::new(self.tri, MINUS1MOD3[self.orient as usize])
    }
}

/// An oriented subsegment handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OSub {
    pub seg: u32,
    pub orient: u8,
}

impl OSub {
    pub const GHOST: OSub = OSub {
        seg: GHOST_SUB,
        orient: 0,
    };

    pub fn new(seg: u32, orient: u8) -> Self {
        Self { seg, orient }
    }

    pub fn is_ghost(&self) -> bool {
        self.seg == GHOST_SUB
    }

    /// The same subsegment from the other side
    #[inline]
    pub fn ssym(&self) -> OSub {
        OSub::new(self.seg, 1 - self.orient)
    }
}

/// A triangle record: three vertex slots, three neighbor handles, three
/// adjoining subsegment slots, and the region/area/infection attributes
/// carried by flood-fill algorithms.
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [u32; 3],
    pub neighbors: [OTri; 3],
    pub subsegs: [OSub; 3],
    pub region: i32,
    pub area: f64,
    pub infected: bool,
}

impl Triangle {
    fn new() -> Self {
        Self {
            vertices: [NO_VERTEX; 3],
            neighbors: [OTri::GHOST; 3],
            subsegs: [OSub::GHOST; 3],
            region: 0,
            area: -1.0,
            infected: false,
        }
    }
}

/// A subsegment record: two endpoint slots, the two adjoining subsegments
/// along its containing segment, and the two adjoining triangles.
#[derive(Debug, Clone)]
pub struct SubSegment {
    pub vertices: [u32; 2],
    pub neighbors: [OSub; 2],
    pub triangles: [OTri; 2],
    pub mark: i32,
}

impl SubSegment {
    fn new() -> Self {
        Self {
            vertices: [NO_VERTEX; 2],
            neighbors: [OSub::GHOST; 2],
            triangles: [OTri::GHOST; 2],
            mark: 0,
        }
    }
}

/// The triangulation arena and its handle operations
pub struct TriMesh {
    pub vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    subsegs: Vec<SubSegment>,
    dead_triangles: Vec<u32>,
    dead_subsegs: Vec<u32>,
    /// A hull-adjacent handle stored when ghosts are stripped; point
    /// location and hull walks start here.
    pub hull_entry: OTri,
    /// Number of convex hull edges after ghost removal
    pub hull_size: usize,
    /// Number of vertices marked Undead (duplicates, box corners)
    pub undead_count: usize,
}

impl TriMesh {
    pub fn new() -> Self {
        Self {
            // Slot 0 is the ghost sentinel in both arenas.
            vertices: Vec::new(),
            triangles: vec![Triangle::new()],
            subsegs: vec![SubSegment::new()],
            dead_triangles: Vec::new(),
            dead_subsegs: Vec::new(),
            hull_entry: OTri::GHOST,
            hull_size: 0,
            undead_count: 0,
        }
    }

    /// Append an input vertex carrying the caller payload index
    pub fn add_vertex(&mut self, x: f64, y: f64, sample: u32) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            x,
            y,
            sample,
            kind: VertexKind::Input,
            id: -1,
            mark: 0,
        });
        index
    }

    #[inline]
    pub fn vertex(&self, v: u32) -> &Vertex {
        &self.vertices[v as usize]
    }

    #[inline]
    pub fn vertex_point(&self, v: u32) -> Point2d {
        self.vertices[v as usize].point()
    }

    // -- triangle allocation --------------------------------------------

    /// Allocate a fresh triangle with every slot set to the sentinels
    pub fn make_triangle(&mut self) -> OTri {
        let index = match self.dead_triangles.pop() {
            Some(index) => {
                self.triangles[index as usize] = Triangle::new();
                index
            }
            None => {
                self.triangles.push(Triangle::new());
                (self.triangles.len() - 1) as u32
            }
        };
        OTri::new(index, 0)
    }

    /// Mark a triangle dead and recycle its arena slot
    pub fn triangle_dealloc(&mut self, tri: u32) {
        debug_assert_ne!(tri, GHOST_TRI);
        self.triangles[tri as usize].neighbors[0] = OTri::new(NO_TRI, 0);
        self.dead_triangles.push(tri);
    }

    #[inline]
    pub fn is_dead(&self, tri: u32) -> bool {
        self.triangles[tri as usize].neighbors[0].tri == NO_TRI
    }

    /// Number of live triangles, the ghost excluded
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() - 1 - self.dead_triangles.len()
    }

    /// Iterate over the arena indices of live triangles
    pub fn live_triangles(&self) -> impl Iterator<Item = u32> + '_ {
        (1..self.triangles.len() as u32).filter(move |&t| !self.is_dead(t))
    }

    // -- oriented triangle primitives -----------------------------------

    /// Cross to the triangle on the other side of the edge
    #[inline]
    pub fn sym(&self, ot: OTri) -> OTri {
        self.triangles[ot.tri as usize].neighbors[ot.orient as usize]
    }

    /// Spin counterclockwise around the origin
    #[inline]
    pub fn onext(&self, ot: OTri) -> OTri {
        self.sym(ot.lprev())
    }

    /// Spin clockwise around the origin
    #[inline]
    pub fn oprev(&self, ot: OTri) -> OTri {
        self.sym(ot).lnext()
    }

    /// Spin counterclockwise around the destination
    #[inline]
    pub fn dnext(&self, ot: OTri) -> OTri {
        self.sym(ot).lprev()
    }

    /// Spin clockwise around the destination
    #[inline]
    pub fn dprev(&self, ot: OTri) -> OTri {
        self.sym(ot.lnext())
    }

    #[inline]
    pub fn org(&self, ot: OTri) -> u32 {
        self.triangles[ot.tri as usize].vertices[PLUS1MOD3[ot.orient as usize] as usize]
    }

    #[inline]
    pub fn dest(&self, ot: OTri) -> u32 {
        self.triangles[ot.tri as usize].vertices[MINUS1MOD3[ot.orient as usize] as usize]
    }

    #[inline]
    pub fn apex(&self, ot: OTri) -> u32 {
        self.triangles[ot.tri as usize].vertices[ot.orient as usize]
    }

    #[inline]
    pub fn set_org(&mut self, ot: OTri, v: u32) {
        self.triangles[ot.tri as usize].vertices[PLUS1MOD3[ot.orient as usize] as usize] = v;
    }

    #[inline]
    pub fn set_dest(&mut self, ot: OTri, v: u32) {
        self.triangles[ot.tri as usize].vertices[MINUS1MOD3[ot.orient as usize] as usize] = v;
    }

    #[inline]
    pub fn set_apex(&mut self, ot: OTri, v: u32) {
        self.triangles[ot.tri as usize].vertices[ot.orient as usize] = v;
    }

    /// Bond two triangles along their current edges. Bonding is mutual: each
    /// side's neighbor slot points back at the other. Bonding against the
    /// ghost leaves the ghost untouched and only records the boundary on the
    /// real side.
    pub fn bond(&mut self, a: OTri, b: OTri) {
        if a.tri != GHOST_TRI {
            self.triangles[a.tri as usize].neighbors[a.orient as usize] = b;
        }
        if b.tri != GHOST_TRI {
            self.triangles[b.tri as usize].neighbors[b.orient as usize] = a;
        }
    }

    /// Break one side of a bond, leaving the ghost sentinel behind
    pub fn dissolve(&mut self, ot: OTri) {
        if ot.tri != GHOST_TRI {
            self.triangles[ot.tri as usize].neighbors[ot.orient as usize] = OTri::GHOST;
        }
    }

    pub fn infect(&mut self, tri: u32) {
        self.triangles[tri as usize].infected = true;
    }

    pub fn uninfect(&mut self, tri: u32) {
        self.triangles[tri as usize].infected = false;
    }

    pub fn is_infected(&self, tri: u32) -> bool {
        self.triangles[tri as usize].infected
    }

    pub fn triangle_vertices(&self, tri: u32) -> [u32; 3] {
        self.triangles[tri as usize].vertices
    }

    // -- subsegment primitives ------------------------------------------

    /// Allocate a fresh subsegment with every slot set to the sentinels
    pub fn make_subseg(&mut self) -> OSub {
        let index = match self.dead_subsegs.pop() {
            Some(index) => {
                self.subsegs[index as usize] = SubSegment::new();
                index
            }
            None => {
                self.subsegs.push(SubSegment::new());
                (self.subsegs.len() - 1) as u32
            }
        };
        OSub::new(index, 0)
    }

    pub fn subseg_dealloc(&mut self, seg: u32) {
        debug_assert_ne!(seg, GHOST_SUB);
        self.subsegs[seg as usize].vertices = [NO_VERTEX; 2];
        self.dead_subsegs.push(seg);
    }

    /// The adjoining subsegment on the other side of the far endpoint
    #[inline]
    pub fn spivot(&self, os: OSub) -> OSub {
        self.subsegs[os.seg as usize].neighbors[os.orient as usize]
    }

    /// The next subsegment along the containing segment
    #[inline]
    pub fn snext(&self, os: OSub) -> OSub {
        self.subsegs[os.seg as usize].neighbors[1 - os.orient as usize]
    }

    #[inline]
    pub fn sorg(&self, os: OSub) -> u32 {
        self.subsegs[os.seg as usize].vertices[os.orient as usize]
    }

    #[inline]
    pub fn sdest(&self, os: OSub) -> u32 {
        self.subsegs[os.seg as usize].vertices[1 - os.orient as usize]
    }

    #[inline]
    pub fn set_sorg(&mut self, os: OSub, v: u32) {
        self.subsegs[os.seg as usize].vertices[os.orient as usize] = v;
    }

    #[inline]
    pub fn set_sdest(&mut self, os: OSub, v: u32) {
        self.subsegs[os.seg as usize].vertices[1 - os.orient as usize] = v;
    }

    /// Bond two subsegments end to end; mutual, ghost left untouched
    pub fn sbond(&mut self, a: OSub, b: OSub) {
        if a.seg != GHOST_SUB {
            self.subsegs[a.seg as usize].neighbors[a.orient as usize] = b;
        }
        if b.seg != GHOST_SUB {
            self.subsegs[b.seg as usize].neighbors[b.orient as usize] = a;
        }
    }

    pub fn sdissolve(&mut self, os: OSub) {
        if os.seg != GHOST_SUB {
            self.subsegs[os.seg as usize].neighbors[os.orient as usize] = OSub::GHOST;
        }
    }

    /// Cross from a subsegment side to the adjoining triangle
    #[inline]
    pub fn tri_pivot(&self, os: OSub) -> OTri {
        self.subsegs[os.seg as usize].triangles[os.orient as usize]
    }

    /// The subsegment adjoining a triangle edge (ghost when unsegmented)
    #[inline]
    pub fn tspivot(&self, ot: OTri) -> OSub {
        self.triangles[ot.tri as usize].subsegs[ot.orient as usize]
    }

    /// Attach a subsegment to a triangle edge and vice versa
    pub fn tsbond(&mut self, ot: OTri, os: OSub) {
        if ot.tri != GHOST_TRI {
            self.triangles[ot.tri as usize].subsegs[ot.orient as usize] = os;
        }
        if os.seg != GHOST_SUB {
            self.subsegs[os.seg as usize].triangles[os.orient as usize] = ot;
        }
    }

    pub fn tsdissolve(&mut self, ot: OTri) {
        if ot.tri != GHOST_TRI {
            self.triangles[ot.tri as usize].subsegs[ot.orient as usize] = OSub::GHOST;
        }
    }

    // -- edge flip ------------------------------------------------------

    /// Flip the edge of `flipedge`, rotating the containing quadrilateral a
    /// quarter turn counterclockwise. The edge must have a live triangle on
    /// both sides; any subsegments riding the outer edges move with them.
    pub fn flip(&mut self, flipedge: OTri) {
        let leftvertex = self.org(flipedge);
        let rightvertex = self.dest(flipedge);
        let botvertex = self.apex(flipedge);
        let top = self.sym(flipedge);
        debug_assert!(!top.is_ghost(), "flip requires two live triangles");
        let farvertex = self.apex(top);

        // Casing of the quadrilateral.
        let topleft = top.lprev();
        let toplcasing = self.sym(topleft);
        let topright = top.lnext();
        let toprcasing = self.sym(topright);
        let botleft = flipedge.lnext();
        let botlcasing = self.sym(botleft);
        let botright = flipedge.lprev();
        let botrcasing = self.sym(botright);

        // Rotate the quadrilateral one-quarter turn counterclockwise.
        self.bond(topleft, botlcasing);
        self.bond(botleft, botrcasing);
        self.bond(botright, toprcasing);
        self.bond(topright, toplcasing);

        // Any subsegments ride along with their outer edges.
        let toplsubseg = self.tspivot(topleft);
        let botlsubseg = self.tspivot(botleft);
        let botrsubseg = self.tspivot(botright);
        let toprsubseg = self.tspivot(topright);

        if toplsubseg.is_ghost() {
            self.tsdissolve(topright);
        } else {
            self.tsbond(topright, toplsubseg);
        }
        if botlsubseg.is_ghost() {
            self.tsdissolve(topleft);
        } else {
            self.tsbond(topleft, botlsubseg);
        }
        if botrsubseg.is_ghost() {
            self.tsdissolve(botleft);
        } else {
            self.tsbond(botleft, botrsubseg);
        }
        if toprsubseg.is_ghost() {
            self.tsdissolve(botright);
        } else {
            self.tsbond(botright, toprsubseg);
        }

        // New vertex assignments for the rotated quadrilateral.
        self.set_org(flipedge, farvertex);
        self.set_dest(flipedge, botvertex);
        self.set_apex(flipedge, rightvertex);
        self.set_org(top, botvertex);
        self.set_dest(top, farvertex);
        self.set_apex(top, leftvertex);
    }

    // -- output ---------------------------------------------------------

    /// Assign consecutive output ids to live vertices, skipping Undead ones.
    /// Returns the live count.
    pub fn number_vertices(&mut self) -> usize {
        let mut id = 0;
        for vertex in &mut self.vertices {
            if vertex.kind == VertexKind::Undead {
                vertex.id = -1;
            } else {
                vertex.id = id;
                id += 1;
            }
        }
        id as usize
    }

    /// Signed doubled area of a live triangle
    pub fn triangle_orientation(&self, tri: u32) -> f64 {
        let t = OTri::new(tri, 0);
        counterclockwise(
            self.vertex_point(self.org(t)),
            self.vertex_point(self.dest(t)),
            self.vertex_point(self.apex(t)),
        )
    }

    /// Extract output faces as triples of caller payload indices.
    ///
    /// Every returned face is counterclockwise in the plane.
    pub fn extract_faces(&self) -> Vec<[u32; 3]> {
        let mut faces = Vec::with_capacity(self.triangle_count());
        for tri in self.live_triangles() {
            let t = OTri::new(tri, 0);
            let (org, dest, apex) = (self.org(t), self.dest(t), self.apex(t));
            if org == NO_VERTEX || dest == NO_VERTEX || apex == NO_VERTEX {
                continue;
            }
            faces.push([
                self.vertex(org).sample,
                self.vertex(dest).sample,
                self.vertex(apex).sample,
            ]);
        }
        faces
    }
}

impl Default for TriMesh {
    fn default() -> Self {
        Self::new()
    }
}
