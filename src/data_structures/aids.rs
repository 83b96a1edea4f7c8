//! Orientation aids: a ground-plane grid and the three coordinate axes.
//!
//! Both are plain coloured line lists, uploaded once per session.

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub colour: [f32; 3],
}

/// Line list: every two consecutive vertices form one segment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineMesh {
    pub label: &'static str,
    pub vertices: Vec<LineVertex>,
}

impl LineMesh {
    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }

    fn push(&mut self, from: [f32; 3], to: [f32; 3], colour: [f32; 3]) {
        self.vertices.push(LineVertex {
            position: from,
            colour,
        });
        self.vertices.push(LineVertex {
            position: to,
            colour,
        });
    }
}

const GRID_CENTRE: [f32; 3] = [0.27, 0.27, 0.27];
const GRID_LINE: [f32; 3] = [0.53, 0.53, 0.53];

/// Square grid on the y = 0 plane, centred on the origin.
pub fn ground_grid(size: f32, divisions: u32) -> LineMesh {
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;
    let mut mesh = LineMesh {
        label: "ground grid",
        ..Default::default()
    };
    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        let colour = if 2 * i == divisions {
            GRID_CENTRE
        } else {
            GRID_LINE
        };
        mesh.push([-half, 0.0, offset], [half, 0.0, offset], colour);
        mesh.push([offset, 0.0, -half], [offset, 0.0, half], colour);
    }
    mesh
}

/// X red, Y green, Z blue, starting at the origin.
pub fn axes(length: f32) -> LineMesh {
    let mut mesh = LineMesh {
        label: "axes",
        ..Default::default()
    };
    mesh.push([0.0; 3], [length, 0.0, 0.0], [1.0, 0.0, 0.0]);
    mesh.push([0.0; 3], [0.0, length, 0.0], [0.0, 1.0, 0.0]);
    mesh.push([0.0; 3], [0.0, 0.0, length], [0.0, 0.0, 1.0]);
    mesh
}
