//! Transform node arena
//!
//! Nodes hold position/scale/orientation and an optional parent, and compose
//! a model matrix by chaining parent transforms. Nodes live in an arena and
//! reference their parent by index, so the hierarchy stays a tree: a cycle
//! would require re-parenting, and `set_parent` refuses to create one.

use cgmath::{Deg, Matrix4, Quaternion, Rotation3, Vector3, Zero};

/// Index of a node within a [`TransformArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Position, scale and orientation of one entity.
///
/// The local matrix is translation x rotation x scale; the model matrix
/// additionally chains the parent's model matrix on the left. Matrices are
/// recomputed on demand, never cached.
#[derive(Clone, Debug)]
pub struct TransformNode {
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    parent: Option<NodeId>,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            parent: None,
        }
    }
}

impl TransformNode {
    /// Local transform, ignoring any parent.
    pub fn local_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Arena owning all transform nodes of a scene.
#[derive(Default)]
pub struct TransformArena {
    nodes: Vec<TransformNode>,
}

impl TransformArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Adds a node with identity transform and no parent.
    pub fn spawn(&mut self) -> NodeId {
        self.nodes.push(TransformNode::default());
        NodeId(self.nodes.len() - 1)
    }

    /// Adds a node at `position` with unit scale and identity orientation.
    pub fn spawn_at(&mut self, position: Vector3<f32>) -> NodeId {
        let id = self.spawn();
        self.nodes[id.0].position = position;
        id
    }

    pub fn node(&self, id: NodeId) -> &TransformNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TransformNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sets the absolute position.
    pub fn move_to(&mut self, id: NodeId, position: Vector3<f32>) {
        self.nodes[id.0].position = position;
    }

    /// Sets a uniform absolute scale.
    pub fn scale_to(&mut self, id: NodeId, factor: f32) {
        self.nodes[id.0].scale = Vector3::new(factor, factor, factor);
    }

    /// Sets a per-axis absolute scale.
    pub fn scale_to_xyz(&mut self, id: NodeId, scale: Vector3<f32>) {
        self.nodes[id.0].scale = scale;
    }

    /// Sets the absolute orientation to a rotation of `angle` about `axis`.
    pub fn rotate_to(&mut self, id: NodeId, angle: Deg<f32>, axis: Vector3<f32>) {
        use cgmath::InnerSpace;
        self.nodes[id.0].rotation = Quaternion::from_axis_angle(axis.normalize(), angle);
    }

    /// Applies a relative rotation of `angle` about `axis` on top of the
    /// current orientation.
    pub fn rotate(&mut self, id: NodeId, angle: Deg<f32>, axis: Vector3<f32>) {
        use cgmath::InnerSpace;
        let step = Quaternion::from_axis_angle(axis.normalize(), angle);
        let node = &mut self.nodes[id.0];
        node.rotation = step * node.rotation;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Parents `child` under `parent`.
    ///
    /// Panics if the edge would close a cycle (including self-parenting);
    /// the hierarchy must stay a tree for `model_matrix` to terminate.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            assert!(
                id != child,
                "transform parent cycle: node {} is an ancestor of node {}",
                child.0,
                parent.0
            );
            cursor = self.nodes[id.0].parent;
        }
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn clear_parent(&mut self, child: NodeId) {
        self.nodes[child.0].parent = None;
    }

    /// Composed model matrix: the parent chain's matrices applied left of the
    /// node's own local matrix.
    pub fn model_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut matrix = self.nodes[id.0].local_matrix();
        let mut cursor = self.nodes[id.0].parent;
        while let Some(parent) = cursor {
            matrix = self.nodes[parent.0].local_matrix() * matrix;
            cursor = self.nodes[parent.0].parent;
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    fn assert_mat_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        for (col_a, col_b) in a.iter().zip(b.iter()) {
            for (x, y) in col_a.iter().zip(col_b.iter()) {
                assert!((x - y).abs() < 1e-5, "{:?} != {:?}", a, b);
            }
        }
    }

    #[test]
    fn fresh_node_is_identity() {
        let mut arena = TransformArena::new();
        let id = arena.spawn();
        assert_mat_eq(arena.model_matrix(id), Matrix4::identity());
    }

    #[test]
    fn parentless_node_composes_trs() {
        let mut arena = TransformArena::new();
        let id = arena.spawn();
        arena.move_to(id, Vector3::new(1.0, 2.0, 3.0));
        arena.rotate_to(id, Deg(30.0), Vector3::new(0.0, 1.0, 0.0));
        arena.scale_to(id, 2.0);

        let expected = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0))
            * Matrix4::from(Quaternion::from_axis_angle(
                Vector3::new(0.0, 1.0, 0.0),
                Deg(30.0),
            ))
            * Matrix4::from_scale(2.0);
        assert_mat_eq(arena.model_matrix(id), expected);
    }

    #[test]
    fn setter_order_does_not_matter() {
        let mut a = TransformArena::new();
        let x = a.spawn();
        a.move_to(x, Vector3::new(1.0, 0.0, 0.0));
        a.scale_to(x, 3.0);
        a.rotate_to(x, Deg(90.0), Vector3::new(0.0, 0.0, 1.0));

        let mut b = TransformArena::new();
        let y = b.spawn();
        b.rotate_to(y, Deg(90.0), Vector3::new(0.0, 0.0, 1.0));
        b.move_to(y, Vector3::new(2.0, 0.0, 0.0));
        b.scale_to(y, 3.0);
        // last write wins per field
        b.move_to(y, Vector3::new(1.0, 0.0, 0.0));

        assert_mat_eq(a.model_matrix(x), b.model_matrix(y));
    }

    #[test]
    fn relative_rotation_premultiplies() {
        let mut arena = TransformArena::new();
        let id = arena.spawn();
        arena.rotate_to(id, Deg(45.0), Vector3::new(0.0, 1.0, 0.0));
        arena.rotate(id, Deg(45.0), Vector3::new(0.0, 1.0, 0.0));

        let mut expected = TransformArena::new();
        let e = expected.spawn();
        expected.rotate_to(e, Deg(90.0), Vector3::new(0.0, 1.0, 0.0));
        assert_mat_eq(arena.model_matrix(id), expected.model_matrix(e));
    }

    #[test]
    fn child_chains_through_parents() {
        let mut arena = TransformArena::new();
        let root = arena.spawn_at(Vector3::new(1.0, 0.0, 0.0));
        let mid = arena.spawn_at(Vector3::new(0.0, 2.0, 0.0));
        let leaf = arena.spawn_at(Vector3::new(0.0, 0.0, 3.0));
        arena.rotate_to(mid, Deg(90.0), Vector3::new(0.0, 1.0, 0.0));
        arena.scale_to(root, 2.0);
        arena.set_parent(mid, root);
        arena.set_parent(leaf, mid);

        let expected = arena.model_matrix(mid) * arena.node(leaf).local_matrix();
        assert_mat_eq(arena.model_matrix(leaf), expected);

        let expected_mid = arena.model_matrix(root) * arena.node(mid).local_matrix();
        assert_mat_eq(arena.model_matrix(mid), expected_mid);
    }

    #[test]
    #[should_panic(expected = "transform parent cycle")]
    fn rejects_parent_cycle() {
        let mut arena = TransformArena::new();
        let a = arena.spawn();
        let b = arena.spawn();
        let c = arena.spawn();
        arena.set_parent(b, a);
        arena.set_parent(c, b);
        arena.set_parent(a, c);
    }

    #[test]
    #[should_panic(expected = "transform parent cycle")]
    fn rejects_self_parenting() {
        let mut arena = TransformArena::new();
        let a = arena.spawn();
        arena.set_parent(a, a);
    }
}
