//! 报告标签的本地化表
//!
//! 查找顺序：目标语言 → 英语 → 键名本身

use phf::phf_map;

use crate::models::template::Language;

static KO: phf::Map<&'static str, &'static str> = phf_map! {
    "title.report" => "학생 종합 평가 보고서",
    "section.student" => "학생 정보",
    "section.evaluations" => "평가 현황",
    "section.topik" => "TOPIK 성적 분석",
    "section.preferences" => "진학 희망 이력",
    "section.achievements" => "수상 및 성과",
    "section.consultations" => "상담 기록",
    "field.student_code" => "학번",
    "field.student_name" => "이름",
    "field.purpose" => "용도",
    "field.period" => "기간",
    "field.counselor_evaluation" => "상담 교사 소견",
    "field.university" => "대학",
    "field.major" => "전공",
    "field.rank" => "지망 순위",
    "field.date" => "날짜",
    "field.category" => "분류",
    "field.summary" => "요약",
    "field.title" => "제목",
    "field.description" => "내용",
    "dimension.academic" => "학업 성취",
    "dimension.attitude" => "수업 태도",
    "dimension.attendance" => "출결",
    "dimension.adaptation" => "생활 적응",
    "dimension.career_readiness" => "진학 준비도",
    "topik.attempts" => "응시 횟수",
    "topik.latest_total" => "최근 총점",
    "topik.best_total" => "최고 총점",
    "topik.average_total" => "평균 총점",
    "topik.slope" => "회차별 변화",
    "topik.pattern" => "성적 추이",
    "topik.confidence" => "예측 신뢰도",
    "topik.next_score" => "다음 예상 점수",
    "topik.predicted_level" => "예상 급수",
    "topik.target_score" => "목표 점수",
    "topik.tests_to_target" => "목표 도달 예상 회차",
    "topik.strengths" => "강점 영역",
    "topik.weaknesses" => "보완 영역",
    "topik.reading" => "읽기",
    "topik.listening" => "듣기",
    "topik.writing" => "쓰기",
    "topik.test_number" => "회차",
    "topik.total" => "총점",
    "topik.level" => "급수",
    "topik.history" => "모의고사 성적표",
    "rating.excellent" => "우수",
    "rating.good" => "양호",
    "rating.average" => "보통",
    "rating.poor" => "미흡",
    "pattern.rapid_improvement" => "급상승",
    "pattern.steady_improvement" => "꾸준한 상승",
    "pattern.gradual_improvement" => "완만한 상승",
    "pattern.stable" => "유지",
    "pattern.needs_support" => "지원 필요",
    "pattern.insufficient_data" => "데이터 부족",
    "confidence.high" => "높음",
    "confidence.medium" => "보통",
    "confidence.low" => "낮음",
    "category.academic" => "학업",
    "category.life" => "생활",
    "category.career" => "진로",
    "category.topik" => "TOPIK",
    "category.achievement" => "성과",
    "category.general" => "일반",
    "purpose.routine" => "정기 보고",
    "purpose.visa" => "비자 제출용",
    "purpose.university" => "대학 제출용",
    "value.none" => "-",
    "value.balanced" => "균형",
    "value.all_periods" => "전체 기간",
};

static EN: phf::Map<&'static str, &'static str> = phf_map! {
    "title.report" => "Student Evaluation Report",
    "section.student" => "Student",
    "section.evaluations" => "Evaluations",
    "section.topik" => "TOPIK Analysis",
    "section.preferences" => "University Preferences",
    "section.achievements" => "Achievements",
    "section.consultations" => "Consultations",
    "field.student_code" => "Student code",
    "field.student_name" => "Name",
    "field.purpose" => "Purpose",
    "field.period" => "Period",
    "field.counselor_evaluation" => "Counselor evaluation",
    "field.university" => "University",
    "field.major" => "Major",
    "field.rank" => "Rank",
    "field.date" => "Date",
    "field.category" => "Category",
    "field.summary" => "Summary",
    "field.title" => "Title",
    "field.description" => "Description",
    "dimension.academic" => "Academic performance",
    "dimension.attitude" => "Class attitude",
    "dimension.attendance" => "Attendance",
    "dimension.adaptation" => "Life adaptation",
    "dimension.career_readiness" => "Career readiness",
    "topik.attempts" => "Attempts",
    "topik.latest_total" => "Latest total",
    "topik.best_total" => "Best total",
    "topik.average_total" => "Average total",
    "topik.slope" => "Change per attempt",
    "topik.pattern" => "Trend",
    "topik.confidence" => "Confidence",
    "topik.next_score" => "Predicted next score",
    "topik.predicted_level" => "Predicted level",
    "topik.target_score" => "Target score",
    "topik.tests_to_target" => "Attempts to target",
    "topik.strengths" => "Strengths",
    "topik.weaknesses" => "Weaknesses",
    "topik.reading" => "Reading",
    "topik.listening" => "Listening",
    "topik.writing" => "Writing",
    "topik.test_number" => "Attempt",
    "topik.total" => "Total",
    "topik.level" => "Level",
    "topik.history" => "Mock test scores",
    "rating.excellent" => "Excellent",
    "rating.good" => "Good",
    "rating.average" => "Average",
    "rating.poor" => "Poor",
    "pattern.rapid_improvement" => "Rapid improvement",
    "pattern.steady_improvement" => "Steady improvement",
    "pattern.gradual_improvement" => "Gradual improvement",
    "pattern.stable" => "Stable",
    "pattern.needs_support" => "Needs support",
    "pattern.insufficient_data" => "Insufficient data",
    "confidence.high" => "High",
    "confidence.medium" => "Medium",
    "confidence.low" => "Low",
    "category.academic" => "Academic",
    "category.life" => "Life",
    "category.career" => "Career",
    "category.topik" => "TOPIK",
    "category.achievement" => "Achievement",
    "category.general" => "General",
    "purpose.routine" => "Routine",
    "purpose.visa" => "Visa submission",
    "purpose.university" => "University application",
    "value.none" => "-",
    "value.balanced" => "Balanced",
    "value.all_periods" => "All periods",
};

static VI: phf::Map<&'static str, &'static str> = phf_map! {
    "title.report" => "Báo cáo đánh giá học sinh",
    "section.student" => "Thông tin học sinh",
    "section.evaluations" => "Đánh giá",
    "section.topik" => "Phân tích TOPIK",
    "section.preferences" => "Nguyện vọng đại học",
    "section.achievements" => "Thành tích",
    "section.consultations" => "Hồ sơ tư vấn",
    "field.student_code" => "Mã học sinh",
    "field.student_name" => "Họ tên",
    "field.purpose" => "Mục đích",
    "field.period" => "Thời gian",
    "field.counselor_evaluation" => "Nhận xét của giáo viên tư vấn",
    "field.university" => "Trường đại học",
    "field.major" => "Chuyên ngành",
    "field.rank" => "Thứ tự nguyện vọng",
    "field.date" => "Ngày",
    "field.category" => "Phân loại",
    "field.summary" => "Tóm tắt",
    "field.title" => "Tiêu đề",
    "field.description" => "Nội dung",
    "dimension.academic" => "Kết quả học tập",
    "dimension.attitude" => "Thái độ học tập",
    "dimension.attendance" => "Chuyên cần",
    "dimension.adaptation" => "Thích nghi cuộc sống",
    "dimension.career_readiness" => "Mức độ sẵn sàng học lên",
    "topik.attempts" => "Số lần thi",
    "topik.latest_total" => "Tổng điểm gần nhất",
    "topik.best_total" => "Tổng điểm cao nhất",
    "topik.average_total" => "Tổng điểm trung bình",
    "topik.slope" => "Thay đổi mỗi lần thi",
    "topik.pattern" => "Xu hướng",
    "topik.confidence" => "Độ tin cậy",
    "topik.next_score" => "Điểm dự đoán lần tới",
    "topik.predicted_level" => "Cấp độ dự đoán",
    "topik.target_score" => "Điểm mục tiêu",
    "topik.tests_to_target" => "Số lần thi để đạt mục tiêu",
    "topik.strengths" => "Điểm mạnh",
    "topik.weaknesses" => "Điểm cần cải thiện",
    "topik.reading" => "Đọc",
    "topik.listening" => "Nghe",
    "topik.writing" => "Viết",
    "topik.test_number" => "Lần thi",
    "topik.total" => "Tổng điểm",
    "topik.level" => "Cấp độ",
    "topik.history" => "Bảng điểm thi thử",
    "rating.excellent" => "Xuất sắc",
    "rating.good" => "Tốt",
    "rating.average" => "Trung bình",
    "rating.poor" => "Yếu",
    "pattern.rapid_improvement" => "Tiến bộ nhanh",
    "pattern.steady_improvement" => "Tiến bộ đều",
    "pattern.gradual_improvement" => "Tiến bộ chậm",
    "pattern.stable" => "Ổn định",
    "pattern.needs_support" => "Cần hỗ trợ",
    "pattern.insufficient_data" => "Chưa đủ dữ liệu",
    "confidence.high" => "Cao",
    "confidence.medium" => "Trung bình",
    "confidence.low" => "Thấp",
    "category.academic" => "Học tập",
    "category.life" => "Đời sống",
    "category.career" => "Định hướng",
    "category.topik" => "TOPIK",
    "category.achievement" => "Thành tích",
    "category.general" => "Chung",
    "purpose.routine" => "Định kỳ",
    "purpose.visa" => "Nộp hồ sơ visa",
    "purpose.university" => "Nộp hồ sơ đại học",
    "value.none" => "-",
    "value.balanced" => "Cân bằng",
    "value.all_periods" => "Toàn bộ thời gian",
};

static ZH: phf::Map<&'static str, &'static str> = phf_map! {
    "title.report" => "学生综合评价报告",
    "section.student" => "学生信息",
    "section.evaluations" => "评价概况",
    "section.topik" => "TOPIK 成绩分析",
    "section.preferences" => "升学志愿记录",
    "section.achievements" => "获奖与成果",
    "section.consultations" => "咨询记录",
    "field.student_code" => "学号",
    "field.student_name" => "姓名",
    "field.purpose" => "用途",
    "field.period" => "期间",
    "field.counselor_evaluation" => "咨询老师评语",
    "field.university" => "大学",
    "field.major" => "专业",
    "field.rank" => "志愿顺位",
    "field.date" => "日期",
    "field.category" => "类别",
    "field.summary" => "摘要",
    "field.title" => "标题",
    "field.description" => "内容",
    "dimension.academic" => "学业表现",
    "dimension.attitude" => "课堂态度",
    "dimension.attendance" => "出勤",
    "dimension.adaptation" => "生活适应",
    "dimension.career_readiness" => "升学准备度",
    "topik.attempts" => "模考次数",
    "topik.latest_total" => "最近总分",
    "topik.best_total" => "最高总分",
    "topik.average_total" => "平均总分",
    "topik.slope" => "每次变化",
    "topik.pattern" => "成绩走势",
    "topik.confidence" => "预测置信度",
    "topik.next_score" => "下次预测分数",
    "topik.predicted_level" => "预测等级",
    "topik.target_score" => "目标分数",
    "topik.tests_to_target" => "预计达标次数",
    "topik.strengths" => "强项",
    "topik.weaknesses" => "弱项",
    "topik.reading" => "阅读",
    "topik.listening" => "听力",
    "topik.writing" => "写作",
    "topik.test_number" => "次数",
    "topik.total" => "总分",
    "topik.level" => "等级",
    "topik.history" => "模考成绩表",
    "rating.excellent" => "优秀",
    "rating.good" => "良好",
    "rating.average" => "一般",
    "rating.poor" => "较差",
    "pattern.rapid_improvement" => "快速提升",
    "pattern.steady_improvement" => "稳步提升",
    "pattern.gradual_improvement" => "缓慢提升",
    "pattern.stable" => "保持稳定",
    "pattern.needs_support" => "需要辅导",
    "pattern.insufficient_data" => "数据不足",
    "confidence.high" => "高",
    "confidence.medium" => "中",
    "confidence.low" => "低",
    "category.academic" => "学业",
    "category.life" => "生活",
    "category.career" => "升学",
    "category.topik" => "TOPIK",
    "category.achievement" => "成果",
    "category.general" => "综合",
    "purpose.routine" => "日常报告",
    "purpose.visa" => "签证提交",
    "purpose.university" => "大学申请",
    "value.none" => "-",
    "value.balanced" => "均衡",
    "value.all_periods" => "全部期间",
};

fn table(language: Language) -> &'static phf::Map<&'static str, &'static str> {
    match language {
        Language::Ko => &KO,
        Language::En => &EN,
        Language::Vi => &VI,
        Language::Zh => &ZH,
    }
}

pub fn label(language: Language, key: &str) -> String {
    table(language)
        .get(key)
        .or_else(|| EN.get(key))
        .map(|s| s.to_string())
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_covers_the_english_keys() {
        for language in [Language::Ko, Language::Vi, Language::Zh] {
            for key in EN.keys() {
                assert!(
                    table(language).contains_key(key),
                    "{} is missing {}",
                    language,
                    key
                );
            }
        }
    }

    #[test]
    fn unknown_key_falls_back_to_itself() {
        assert_eq!(label(Language::Ko, "rating.good"), "양호");
        assert_eq!(label(Language::Vi, "no.such.key"), "no.such.key");
    }
}
